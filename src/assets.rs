//! Static pages and client script, embedded at build time.

/// Landing page with the create-game form.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Match page; loads [`GAME_JS`].
pub const GAME_HTML: &str = include_str!("../assets/game.html");

/// Browser client that draws the board and long-polls for updates.
pub const GAME_JS: &str = include_str!("../assets/game.js");
