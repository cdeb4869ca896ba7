pub mod elec_id;
pub mod evidence;
pub mod qualification;
