pub mod light;
pub mod phys;
pub mod resources;
pub mod state;

pub use self::{light::*, phys::*, resources::*, state::*};
