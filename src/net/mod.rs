// Presence Node: Network Boundary (ESP-IDF only)
//
// Station-mode Wi-Fi plus the Realtime Database sink. Both are powered only
// for the duration of one report.

pub mod firebase;
pub mod wifi;
