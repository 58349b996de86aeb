//! The sense/control operation table consumed by the logic layer.
//!
//! Operations without parameters are read-only *senses*. Operations with
//! parameters are *controls*. An operation with exactly one parameter is both
//! senseable and controllable.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A value exchanged with the logic layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum LValue {
    /// No value.
    #[default]
    Null,
    /// A number.
    Num(f64),
    /// A text or content name.
    Text(String),
    /// An entity reference.
    Entity(EntityId),
}

impl LValue {
    /// Numeric interpretation: numbers as-is, entity ids as their raw value,
    /// everything else as zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn num(&self) -> f64 {
        match self {
            LValue::Num(v) => *v,
            LValue::Entity(id) => id.id() as f64,
            LValue::Null | LValue::Text(_) => 0.0,
        }
    }

    /// Logic-layer truthiness: non-zero numbers and non-null objects.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            LValue::Null => false,
            LValue::Num(v) => v.abs() >= 1e-5,
            LValue::Text(_) => true,
            LValue::Entity(id) => id.is_valid(),
        }
    }
}

macro_rules! laccess {
    ($($variant:ident = $name:literal $(, obj = $obj:literal)? $(, params = [$($p:literal),*])?;)*) => {
        /// Named sense/control operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum LAccess {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )*
        }

        impl LAccess {
            /// Every operation, in declaration order.
            pub const ALL: &'static [LAccess] = &[$(LAccess::$variant),*];

            /// The operation name used by the logic layer.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(LAccess::$variant => $name,)*
                }
            }

            /// Named parameters of a control operation.
            #[must_use]
            pub const fn params(self) -> &'static [&'static str] {
                match self {
                    $(LAccess::$variant => &[$($($p),*)?],)*
                }
            }

            /// Whether the parameter is an object rather than a number.
            #[must_use]
            pub const fn is_obj(self) -> bool {
                match self {
                    $(LAccess::$variant => false $(|| $obj)?,)*
                }
            }
        }
    };
}

laccess! {
    TotalItems = "totalItems";
    FirstItem = "firstItem";
    FirstItemNeeded = "firstItemNeeded";
    TotalLiquids = "totalLiquids";
    TotalPower = "totalPower";
    ItemCapacity = "itemCapacity";
    LiquidCapacity = "liquidCapacity";
    PowerCapacity = "powerCapacity";
    PowerNetStored = "powerNetStored";
    PowerNetCapacity = "powerNetCapacity";
    PowerNetIn = "powerNetIn";
    PowerNetOut = "powerNetOut";
    Ammo = "ammo";
    AmmoCapacity = "ammoCapacity";
    Health = "health";
    MaxHealth = "maxHealth";
    Heat = "heat";
    Efficiency = "efficiency";
    Timescale = "timescale";
    Rotation = "rotation";
    X = "x";
    Y = "y";
    ShootX = "shootX";
    ShootY = "shootY";
    Size = "size";
    Dead = "dead";
    Range = "range";
    Shooting = "shooting";
    Boosting = "boosting";
    MineX = "mineX";
    MineY = "mineY";
    Mining = "mining";
    Team = "team";
    Type = "type";
    Flag = "flag";
    Controlled = "controlled";
    Controller = "controller";
    Commanded = "commanded";
    Name = "name";
    Config = "config";
    PayloadCount = "payloadCount";
    PayloadType = "payloadType";
    Enabled = "enabled", params = ["to"];
    Shoot = "shoot", params = ["x", "y", "shoot"];
    Shootp = "shootp", obj = true, params = ["unit", "shoot"];
    Configure = "configure", obj = true, params = ["to"];
    Color = "color", params = ["r", "g", "b"];
}

impl LAccess {
    /// Whether the operation can be sensed (at most one parameter).
    #[must_use]
    pub const fn is_senseable(self) -> bool {
        self.params().len() <= 1
    }

    /// Whether the operation can be controlled (at least one parameter).
    #[must_use]
    pub const fn is_control(self) -> bool {
        !self.params().is_empty()
    }

    /// Every senseable operation.
    pub fn senseable() -> impl Iterator<Item = LAccess> {
        Self::ALL.iter().copied().filter(|a| a.is_senseable())
    }

    /// Every controllable operation.
    pub fn controls() -> impl Iterator<Item = LAccess> {
        Self::ALL.iter().copied().filter(|a| a.is_control())
    }

    /// Look up an operation by its logic-layer name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<LAccess> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }
}

impl std::fmt::Display for LAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
