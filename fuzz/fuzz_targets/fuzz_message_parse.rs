#![no_main]

use libfuzzer_sys::fuzz_target;
use rai_messages::Message;
use rai_types::Network;

// Datagram parsing must never panic, whatever the overlay throws at us, and
// anything it accepts must survive a serialize/parse cycle. (Byte identity
// is not required: serialization canonicalizes the version triple and the
// unused extension bits.)
fuzz_target!(|data: &[u8]| {
    for network in [Network::Live, Network::Beta, Network::Test] {
        if let Some(message) = Message::deserialize(data, network) {
            let bytes = message.serialize(network);
            let reparsed = Message::deserialize(&bytes, network);
            assert_eq!(reparsed, Some(message.clone()));
        }
    }
});
