// Adapters: concrete delivery channels and progress reporters.

pub mod channels;
pub mod reporters;
