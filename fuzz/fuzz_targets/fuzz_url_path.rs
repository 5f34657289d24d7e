#![no_main]

use libfuzzer_sys::fuzz_target;
use room_session_client::router::{PathRouter, UrlRouter};

fuzz_target!(|path: &str| {
    let router = PathRouter::new("https:", path);
    let _ = router.connection_intent();
    let _ = router.anonymous_map_url_start();
    router.edit_url_for_room("r", "o", "w");
    let _ = router.connection_intent();
});
