//! Particle species, decay-chain roles and the physical constants used by the
//! mass hypotheses.

use serde::{Deserialize, Serialize};

/// PDG identifier of the anti-S (anti-sexaquark) as assigned by the generator.
pub const PDG_ANTI_S: i32 = -1_020_000_020;
/// PDG identifier of the K-short. Matched on its absolute value.
pub const PDG_KSHORT: i32 = 310;
/// PDG identifier of the anti-Lambda.
pub const PDG_ANTI_LAMBDA: i32 = -3122;
/// PDG identifier of the positive pion.
pub const PDG_PI_PLUS: i32 = 211;
/// PDG identifier of the negative pion.
pub const PDG_PI_MINUS: i32 = -211;
/// PDG identifier of the anti-proton.
pub const PDG_ANTI_PROTON: i32 = -2212;

/// Charged pion mass in GeV.
pub const PION_MASS: f64 = 0.139_570_18;
/// Proton mass in GeV.
pub const PROTON_MASS: f64 = 0.938_272_046;
/// Neutron mass in GeV.
pub const NEUTRON_MASS: f64 = 0.939_565;
/// Nominal K-short mass in GeV.
pub const KSHORT_MASS: f64 = 0.497_614;
/// Nominal Lambda mass in GeV.
pub const LAMBDA_MASS: f64 = 1.115_683;

/// Species relevant to the anti-S decay chain.
///
/// Raw PDG codes are converted exactly once, when the truth collection is
/// scanned. Everything downstream branches on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// The anti-sexaquark.
    AntiS,
    /// K-short (either sign of the PDG code).
    KShort,
    /// Anti-Lambda.
    AntiLambda,
    /// Positive pion.
    PiPlus,
    /// Negative pion.
    PiMinus,
    /// Anti-proton.
    AntiProton,
}

impl Species {
    /// Classifies a raw PDG code, returning `None` for species outside the chain.
    pub fn from_pdg(pdg_id: i32) -> Option<Self> {
        match pdg_id {
            PDG_ANTI_S => Some(Species::AntiS),
            id if id.unsigned_abs() == PDG_KSHORT.unsigned_abs() => Some(Species::KShort),
            PDG_ANTI_LAMBDA => Some(Species::AntiLambda),
            PDG_PI_PLUS => Some(Species::PiPlus),
            PDG_PI_MINUS => Some(Species::PiMinus),
            PDG_ANTI_PROTON => Some(Species::AntiProton),
            _ => None,
        }
    }

    /// Whether the species is one of the two anti-S daughters.
    pub fn is_daughter(self) -> bool {
        matches!(self, Species::KShort | Species::AntiLambda)
    }

    /// Whether the species is one of the charged final-state particles.
    pub fn is_granddaughter(self) -> bool {
        matches!(
            self,
            Species::PiPlus | Species::PiMinus | Species::AntiProton
        )
    }
}

/// Fixed position of a particle within an anti-S output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleRole {
    /// The truth anti-S itself.
    AntiS,
    /// The K-short daughter.
    KShort,
    /// The anti-Lambda daughter.
    AntiLambda,
    /// Positive pion from the K-short.
    KShortPiPlus,
    /// Negative pion from the K-short.
    KShortPiMinus,
    /// Positive pion from the anti-Lambda.
    LambdaPiPlus,
    /// Anti-proton from the anti-Lambda.
    LambdaAntiProton,
}

impl ParticleRole {
    /// All roles in record order.
    pub const ALL: [ParticleRole; 7] = [
        ParticleRole::AntiS,
        ParticleRole::KShort,
        ParticleRole::AntiLambda,
        ParticleRole::KShortPiPlus,
        ParticleRole::KShortPiMinus,
        ParticleRole::LambdaPiPlus,
        ParticleRole::LambdaAntiProton,
    ];

    /// The four charged final-state roles in record order.
    pub const GRANDDAUGHTERS: [ParticleRole; 4] = [
        ParticleRole::KShortPiPlus,
        ParticleRole::KShortPiMinus,
        ParticleRole::LambdaPiPlus,
        ParticleRole::LambdaAntiProton,
    ];

    /// Type index written to output records (0 = anti-S .. 6 = anti-proton).
    pub fn index(self) -> usize {
        match self {
            ParticleRole::AntiS => 0,
            ParticleRole::KShort => 1,
            ParticleRole::AntiLambda => 2,
            ParticleRole::KShortPiPlus => 3,
            ParticleRole::KShortPiMinus => 4,
            ParticleRole::LambdaPiPlus => 5,
            ParticleRole::LambdaAntiProton => 6,
        }
    }

    /// Granddaughter role for a (daughter, granddaughter) species pairing.
    pub fn granddaughter(daughter: Species, granddaughter: Species) -> Option<Self> {
        match (daughter, granddaughter) {
            (Species::KShort, Species::PiPlus) => Some(ParticleRole::KShortPiPlus),
            (Species::KShort, Species::PiMinus) => Some(ParticleRole::KShortPiMinus),
            (Species::AntiLambda, Species::PiPlus) => Some(ParticleRole::LambdaPiPlus),
            (Species::AntiLambda, Species::AntiProton) => Some(ParticleRole::LambdaAntiProton),
            _ => None,
        }
    }
}
