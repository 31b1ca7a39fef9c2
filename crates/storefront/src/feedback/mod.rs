//! Add-to-cart feedback.
//!
//! Exactly one feedback mechanism runs per add-to-cart, chosen by
//! configuration:
//!
//! - [`CartFeedback::OpenCart`] - open the cart panel (default)
//! - [`CartFeedback::FlyingItem`] - fly the product image from the clicked
//!   button to the cart button
//! - [`CartFeedback::Confirmation`] - show an "Added to cart" toast at the
//!   clicked button
//!
//! The two animated mechanisms run on the [`AnimationLayer`].

mod animation;

use std::str::FromStr;

use serde::Serialize;

pub use animation::{
    AnimationId, AnimationKind, AnimationLayer, AnimationPhase, AnimationSnapshot,
    AnimationTiming, DEFAULT_ANIMATION_CEILING,
};

/// Which feedback an add-to-cart produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CartFeedback {
    #[default]
    OpenCart,
    FlyingItem,
    Confirmation,
}

impl CartFeedback {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenCart => "open-cart",
            Self::FlyingItem => "flying-item",
            Self::Confirmation => "confirmation",
        }
    }
}

impl std::fmt::Display for CartFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartFeedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open-cart" => Ok(Self::OpenCart),
            "flying-item" => Ok(Self::FlyingItem),
            "confirmation" => Ok(Self::Confirmation),
            other => Err(format!(
                "unknown cart feedback '{other}' (expected open-cart, flying-item or confirmation)"
            )),
        }
    }
}
