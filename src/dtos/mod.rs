pub mod appointmentdtos;
pub mod contractordtos;
pub mod jobdtos;
pub mod userdtos;
