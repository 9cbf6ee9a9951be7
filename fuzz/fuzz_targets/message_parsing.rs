#![no_main]

use libfuzzer_sys::fuzz_target;
use wa_shell::whatsapp::{Message, RawMessage};
use wa_shell::ConfigValue;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Raw env values never fail to parse and keep their string form
    let value = ConfigValue::parse(text);
    if let ConfigValue::String(s) = &value {
        assert_eq!(s, text);
    }

    if let Ok(raw) = serde_json::from_str::<RawMessage>(text) {
        match Message::from_raw(&raw) {
            Some(message) => {
                assert_eq!(message.id, raw.key.id);
                assert_eq!(message.receiver.is_group, raw.key.remote_jid.is_group());
            }
            None => assert!(raw.content.is_none()),
        }
    }
});
