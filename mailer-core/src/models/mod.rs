pub mod delivery_outcome;
pub mod mail;
