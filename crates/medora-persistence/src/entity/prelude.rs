pub use super::account::Entity as Account;
pub use super::account_role::Entity as AccountRole;
pub use super::admin::Entity as Admin;
pub use super::appointment::Entity as Appointment;
pub use super::department::Entity as Department;
pub use super::doctor::Entity as Doctor;
pub use super::hospital::Entity as Hospital;
pub use super::patient::Entity as Patient;
pub use super::treatment_record::Entity as TreatmentRecord;
