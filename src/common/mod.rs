//! Types shared between the thumbnail core and the X11 adapter

pub mod types;
