pub mod collate;
pub mod etd;
pub mod inventory;
pub mod legacy;
pub mod sip;
pub mod unbag;
pub mod upload;
