// Quick Tabs stateless services
// Services own format knowledge and transport seams: envelope codec,
// message contract, background messaging, event fan-out, storage areas,
// and the URL-finder registry.

pub mod background;
pub mod event_bus;
pub mod message_contract;
pub mod storage_area;
pub mod storage_codec;
pub mod url_finder;
