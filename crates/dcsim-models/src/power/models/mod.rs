//! A collection of host power models.

pub mod constant;
pub mod cubic;
pub mod linear;
pub mod sqrt;
pub mod square;

pub use constant::ConstantPowerModel;
pub use cubic::CubicPowerModel;
pub use linear::LinearPowerModel;
pub use sqrt::SqrtPowerModel;
pub use square::SquarePowerModel;
