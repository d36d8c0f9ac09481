pub mod agent;
pub mod arena;
pub mod collision;
pub mod episode;
pub mod frame;
pub mod match_loop;
pub mod observation;
pub mod opponents;
pub mod physics;
pub mod policy;
pub mod resolver;

pub use agent::*;
pub use arena::*;
pub use collision::Contact;
pub use episode::*;
pub use match_loop::*;
pub use physics::*;
pub use policy::*;
pub use resolver::*;
