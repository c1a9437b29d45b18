pub mod affiliate;
pub mod balance;
pub mod content;
pub mod game;
pub mod notification;
pub mod payment;
pub mod transaction;
pub mod user;

pub use affiliate::*;
pub use balance::*;
pub use content::*;
pub use game::*;
pub use notification::*;
pub use payment::*;
pub use transaction::*;
pub use user::*;
