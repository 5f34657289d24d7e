#![no_main]

use libfuzzer_sys::fuzz_target;
use room_session_client::model::{AnonymousLoginResponse, RegisterResponse};

fuzz_target!(|data: &[u8]| {
    // Bootstrap responses arrive as text; anything that is not valid UTF-8
    // never reaches the parser.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<RegisterResponse>(s);
        let _ = serde_json::from_str::<AnonymousLoginResponse>(s);
    }
});
