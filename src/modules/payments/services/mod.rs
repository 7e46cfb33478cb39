pub mod payment_recorder;

pub use payment_recorder::PaymentRecorder;
