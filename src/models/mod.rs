pub mod appointmentmodel;
pub mod contractormodel;
pub mod jobmodel;
pub mod usermodel;
