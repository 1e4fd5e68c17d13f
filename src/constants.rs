//! Physical constants (SI units).

/// Speed of light in vacuum [m/s].
pub const C_LIGHT: f64 = 299_792_458.0;

/// Elementary charge [C].
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Electron mass [kg].
pub const ELECTRON_MASS: f64 = 9.109_383_701_5e-31;

/// Proton mass [kg].
pub const PROTON_MASS: f64 = 1.672_621_923_69e-27;

/// Vacuum permittivity [F/m].
pub const VACUUM_PERMITTIVITY: f64 = 8.854_187_812_8e-12;
