//! Radio transceiver implementations

pub mod a7106;

pub use a7106::{
    reg, A7106, A7106Error, CalibrationReport, ConfigError, RadioConfig, RxError, Strobe,
    TransceiverState, INIT_SEQUENCE, REGISTER_COUNT,
};
