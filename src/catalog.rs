// Compiled-in catalog of physics constants, variables, equations and
// derivation templates. The catalog is the only persisted artifact of the
// application and it is immutable.

use crate::graph_state::RelationKind;
use eframe::egui::Color32;

/// A physical constant entry.
#[derive(Debug, Clone)]
pub struct ConstantDef {
    pub id: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
}

/// A physical variable entry.
#[derive(Debug, Clone)]
pub struct VariableDef {
    pub id: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
}

/// A rearrangement of an equation solved for one of its variables.
/// Templates are not part of the initial graph; they are materialized as
/// derivation nodes when the parent equation is expanded.
#[derive(Debug, Clone)]
pub struct DerivationDef {
    pub id: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
    /// Id of the variable or constant this rearrangement solves for.
    pub solves_for: &'static str,
}

#[derive(Debug, Clone)]
pub struct EquationDef {
    pub id: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
    /// Ids of the variables and constants appearing in the equation.
    pub variables: &'static [&'static str],
    pub derivations: &'static [DerivationDef],
}

/// A declared semantic relationship between two equations.
#[derive(Debug, Clone)]
pub struct RelationshipDef {
    pub source: &'static str,
    pub target: &'static str,
    pub kind: RelationKind,
    pub description: &'static str,
    pub color: Color32,
    pub width: f32,
}

pub struct Catalog {
    pub constants: Vec<ConstantDef>,
    pub variables: Vec<VariableDef>,
    pub equations: Vec<EquationDef>,
    pub relationships: Vec<RelationshipDef>,
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("equation {equation} references unknown id {missing}")]
    DanglingReference { equation: String, missing: String },
    #[error("id {id} is declared more than once")]
    CollidingId { id: String },
}

/// Load and validate the built-in catalog. Pure and deterministic; it
/// fails only on a bad literal table (dangling reference, colliding id).
pub fn load_catalog() -> Result<Catalog, CatalogError> {
    let catalog = Catalog::builtin();
    catalog.validate()?;
    Ok(catalog)
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            constants: CONSTANTS.to_vec(),
            variables: VARIABLES.to_vec(),
            equations: EQUATIONS.to_vec(),
            relationships: relationships(),
        }
    }

    /// Every id referenced by an equation's variable list or by a
    /// derivation template must resolve to a constant or variable entry,
    /// and every declared id must be unique across the whole catalog.
    /// Derivation template ids count: they share the node id namespace
    /// once their equation is expanded.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut all_ids: std::collections::HashSet<&str> = std::collections::HashSet::new();
        let entity_ids = self
            .constants
            .iter()
            .map(|c| c.id)
            .chain(self.variables.iter().map(|v| v.id))
            .chain(self.equations.iter().map(|e| e.id));
        for id in entity_ids {
            if !all_ids.insert(id) {
                return Err(CatalogError::CollidingId { id: id.to_string() });
            }
        }

        let known: std::collections::HashSet<&str> = self
            .constants
            .iter()
            .map(|c| c.id)
            .chain(self.variables.iter().map(|v| v.id))
            .collect();

        for eq in &self.equations {
            for var_id in eq.variables {
                if !known.contains(var_id) {
                    return Err(CatalogError::DanglingReference {
                        equation: eq.id.to_string(),
                        missing: var_id.to_string(),
                    });
                }
            }
            for deriv in eq.derivations {
                if !all_ids.insert(deriv.id) {
                    return Err(CatalogError::CollidingId {
                        id: deriv.id.to_string(),
                    });
                }
                if !known.contains(deriv.solves_for) {
                    return Err(CatalogError::DanglingReference {
                        equation: eq.id.to_string(),
                        missing: deriv.solves_for.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

pub const CONSTANTS: &[ConstantDef] = &[
    ConstantDef {
        id: "constant_c",
        formula: r"\(c\)",
        description: "Speed of light in a vacuum",
    },
    ConstantDef {
        id: "constant_G",
        formula: r"\(G\)",
        description: "Gravitational constant",
    },
    ConstantDef {
        id: "constant_h",
        formula: r"\(h\)",
        description: "Planck constant",
    },
    ConstantDef {
        id: "constant_k",
        formula: r"\(k\)",
        description: "Boltzmann constant",
    },
];

pub const VARIABLES: &[VariableDef] = &[
    VariableDef {
        id: "variable_m",
        formula: r"\(m\)",
        description: "Mass",
    },
    VariableDef {
        id: "variable_E",
        formula: r"\(E\)",
        description: "Energy",
    },
    VariableDef {
        id: "variable_F",
        formula: r"\(F\)",
        description: "Force",
    },
    VariableDef {
        id: "variable_a",
        formula: r"\(a\)",
        description: "Acceleration",
    },
    VariableDef {
        id: "variable_p",
        formula: r"\(p\)",
        description: "Momentum",
    },
    VariableDef {
        id: "variable_v",
        formula: r"\(v\)",
        description: "Velocity",
    },
    VariableDef {
        id: "variable_r",
        formula: r"\(r\)",
        description: "Distance",
    },
    VariableDef {
        id: "variable_t",
        formula: r"\(t\)",
        description: "Time",
    },
    VariableDef {
        id: "variable_f",
        formula: r"\(f\)",
        description: "Frequency",
    },
    VariableDef {
        id: "variable_lambda",
        formula: r"\(\lambda\)",
        description: "Wavelength",
    },
    VariableDef {
        id: "variable_T",
        formula: r"\(T\)",
        description: "Temperature",
    },
    VariableDef {
        id: "variable_S",
        formula: r"\(S\)",
        description: "Entropy",
    },
    VariableDef {
        id: "variable_Omega",
        formula: r"\(\Omega\)",
        description: "Number of microstates (in statistical mechanics)",
    },
    VariableDef {
        id: "variable_P",
        formula: r"\(P\)",
        description: "Pressure",
    },
    VariableDef {
        id: "variable_V",
        formula: r"\(V\)",
        description: "Volume",
    },
    VariableDef {
        id: "variable_n",
        formula: r"\(n\)",
        description: "Number of moles",
    },
    VariableDef {
        id: "variable_W",
        formula: r"\(W\)",
        description: "Work",
    },
    VariableDef {
        id: "variable_Q",
        formula: r"\(Q\)",
        description: "Heat",
    },
];

pub const EQUATIONS: &[EquationDef] = &[
    EquationDef {
        id: "equation_MassEnergyEquivalence",
        formula: r"\(E=mc^2\)",
        description: "Mass-Energy equivalence formula",
        variables: &["variable_E", "variable_m", "constant_c"],
        derivations: &[
            DerivationDef {
                id: "derivation_c_from_MassEnergyEquivalence",
                formula: r"\(c = \sqrt{\frac{E}{m}}\)",
                description: "Derivation of speed of light from energy and mass",
                solves_for: "constant_c",
            },
            DerivationDef {
                id: "derivation_m_from_MassEnergyEquivalence",
                formula: r"\(m = \frac{E}{c^2}\)",
                description: "Derivation of mass from energy and the speed of light",
                solves_for: "variable_m",
            },
        ],
    },
    EquationDef {
        id: "equation_NewtonSecondLaw",
        formula: r"\(F=ma\)",
        description: "Newton's Second Law of Motion",
        variables: &["variable_F", "variable_m", "variable_a"],
        derivations: &[
            DerivationDef {
                id: "derivation_m_from_NewtonSecondLaw",
                formula: r"\(m = \frac{F}{a}\)",
                description: "Derivation of mass from force and acceleration",
                solves_for: "variable_m",
            },
            DerivationDef {
                id: "derivation_a_from_NewtonSecondLaw",
                formula: r"\(a = \frac{F}{m}\)",
                description: "Derivation of acceleration from force and mass",
                solves_for: "variable_a",
            },
        ],
    },
    EquationDef {
        id: "equation_LinearMomentum",
        formula: r"\(p=mv\)",
        description: "Linear Momentum formula",
        variables: &["variable_p", "variable_m", "variable_v"],
        derivations: &[
            DerivationDef {
                id: "derivation_m_from_LinearMomentum",
                formula: r"\(m = \frac{p}{v}\)",
                description: "Derivation of mass from momentum and velocity",
                solves_for: "variable_m",
            },
            DerivationDef {
                id: "derivation_v_from_LinearMomentum",
                formula: r"\(v = \frac{p}{m}\)",
                description: "Derivation of velocity from momentum and mass",
                solves_for: "variable_v",
            },
        ],
    },
    EquationDef {
        id: "equation_EnergyMomentumEquivalence",
        formula: r"\(E^2 = (pc)^2 + (mc^2)^2\)",
        description: "Energy-Momentum Equivalence formula",
        variables: &["variable_E", "variable_p", "variable_m", "constant_c"],
        derivations: &[],
    },
    EquationDef {
        id: "equation_NewtonGravitation",
        formula: r"\(F = G\frac{m_1m_2}{r^2}\)",
        description: "Newton's Law of Universal Gravitation",
        variables: &["variable_F", "variable_m", "variable_r", "constant_G"],
        derivations: &[],
    },
    EquationDef {
        id: "equation_PlanckEnergyQuantum",
        formula: r"\(E = hf\)",
        description: "Planck's Energy Quantum formula",
        variables: &["variable_E", "variable_f", "constant_h"],
        derivations: &[
            DerivationDef {
                id: "derivation_f_from_PlanckEnergyQuantum",
                formula: r"\(f = \frac{E}{h}\)",
                description: "Derivation of frequency from energy and the Planck constant",
                solves_for: "variable_f",
            },
            DerivationDef {
                id: "derivation_h_from_PlanckEnergyQuantum",
                formula: r"\(h = \frac{E}{f}\)",
                description: "Derivation of the Planck constant from energy and frequency",
                solves_for: "constant_h",
            },
        ],
    },
    EquationDef {
        id: "equation_WaveMechanics",
        formula: r"\(c = f\lambda\)",
        description: "Wave Mechanics relationship",
        variables: &["constant_c", "variable_f", "variable_lambda"],
        derivations: &[
            DerivationDef {
                id: "derivation_f_from_WaveMechanics",
                formula: r"\(f = \frac{c}{\lambda}\)",
                description: "Derivation of frequency from wave speed and wavelength",
                solves_for: "variable_f",
            },
            DerivationDef {
                id: "derivation_lambda_from_WaveMechanics",
                formula: r"\(\lambda = \frac{c}{f}\)",
                description: "Derivation of wavelength from wave speed and frequency",
                solves_for: "variable_lambda",
            },
        ],
    },
    EquationDef {
        id: "equation_IdealGasLaw",
        formula: r"\(PV = nkT\)",
        description: "Ideal Gas Law",
        variables: &[
            "variable_P",
            "variable_V",
            "variable_n",
            "variable_T",
            "constant_k",
        ],
        derivations: &[],
    },
    EquationDef {
        id: "equation_FirstLawThermodynamics",
        formula: r"\(\Delta E = Q - W\)",
        description: "First Law of Thermodynamics",
        variables: &["variable_E", "variable_Q", "variable_W"],
        derivations: &[],
    },
    EquationDef {
        id: "equation_SecondLawThermodynamics",
        formula: r"\(\Delta S \geq \frac{Q}{T}\)",
        description: "Second Law of Thermodynamics",
        variables: &["variable_S", "variable_Q", "variable_T"],
        derivations: &[],
    },
    EquationDef {
        id: "equation_EntropyStatistical",
        formula: r"\(S = k \ln \Omega\)",
        description: "Statistical definition of Entropy",
        variables: &["variable_S", "variable_Omega", "constant_k"],
        derivations: &[],
    },
    EquationDef {
        id: "equation_TimeEnergyUncertainty",
        formula: r"\(\Delta E \Delta t \geq \frac{h}{4\pi}\)",
        description: "Time-Energy Uncertainty Principle",
        variables: &["variable_E", "variable_t", "constant_h"],
        derivations: &[],
    },
    EquationDef {
        id: "equation_KineticEnergy",
        formula: r"\(E_k = \frac{1}{2}mv^2\)",
        description: "Kinetic Energy",
        variables: &["variable_E", "variable_m", "variable_v"],
        derivations: &[],
    },
    EquationDef {
        id: "equation_DopplerEffect",
        formula: r"\(f' = f\left(\frac{c \pm v_r}{c \pm v_s}\right)\)",
        description: "Doppler Effect",
        variables: &["variable_f", "variable_v", "constant_c"],
        derivations: &[],
    },
];

// Color32 construction is not const-friendly enough for a static table.
fn relationships() -> Vec<RelationshipDef> {
    vec![
        RelationshipDef {
            source: "equation_EnergyMomentumEquivalence",
            target: "equation_MassEnergyEquivalence",
            kind: RelationKind::ReducesTo,
            description: "Reduces to E=mc² when momentum (p) is zero",
            color: Color32::from_rgb(255, 165, 0),
            width: 3.0,
        },
        RelationshipDef {
            source: "equation_NewtonSecondLaw",
            target: "equation_LinearMomentum",
            kind: RelationKind::DerivativeRelationship,
            description: "F = dp/dt (Force is rate of change of momentum)",
            color: Color32::from_rgb(60, 160, 60),
            width: 2.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = load_catalog().expect("builtin catalog must validate");
        assert_eq!(catalog.constants.len(), 4);
        assert_eq!(catalog.variables.len(), 18);
        assert_eq!(catalog.equations.len(), 14);
        assert_eq!(catalog.relationships.len(), 2);
    }

    #[test]
    fn dangling_variable_reference_is_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.equations.push(EquationDef {
            id: "equation_Bogus",
            formula: r"\(x=y\)",
            description: "References a variable that does not exist",
            variables: &["variable_zz"],
            derivations: &[],
        });

        match catalog.validate() {
            Err(CatalogError::DanglingReference { equation, missing }) => {
                assert_eq!(equation, "equation_Bogus");
                assert_eq!(missing, "variable_zz");
            }
            Ok(()) => panic!("expected a dangling reference error"),
            Err(other) => panic!("expected a dangling reference error, got {other:?}"),
        }
    }

    #[test]
    fn dangling_solves_for_reference_is_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.equations.push(EquationDef {
            id: "equation_BadDerivation",
            formula: r"\(x=y\)",
            description: "Derivation targets a missing variable",
            variables: &["variable_m"],
            derivations: &[DerivationDef {
                id: "derivation_bad",
                formula: r"\(y=x\)",
                description: "Solves for nothing",
                solves_for: "variable_missing",
            }],
        });

        let err = catalog.validate().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DanglingReference { .. }
        ));
    }

    #[test]
    fn derivation_id_shadowing_an_entity_is_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.equations.push(EquationDef {
            id: "equation_Shadow",
            formula: r"\(x=y\)",
            description: "Derivation id shadows an existing variable",
            variables: &["variable_m"],
            derivations: &[DerivationDef {
                id: "variable_m",
                formula: r"\(y=x\)",
                description: "Shadows the mass variable",
                solves_for: "variable_m",
            }],
        });

        match catalog.validate() {
            Err(CatalogError::CollidingId { id }) => assert_eq!(id, "variable_m"),
            other => panic!("expected CollidingId, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_entity_id_is_rejected() {
        let mut catalog = Catalog::builtin();
        let dup = catalog.variables[0].clone();
        catalog.variables.push(dup);

        match catalog.validate() {
            Err(CatalogError::CollidingId { id }) => assert_eq!(id, "variable_m"),
            other => panic!("expected CollidingId, got {other:?}"),
        }
    }

    #[test]
    fn relationship_endpoints_are_known_equations() {
        let catalog = Catalog::builtin();
        let ids: std::collections::HashSet<&str> =
            catalog.equations.iter().map(|e| e.id).collect();
        for rel in &catalog.relationships {
            assert!(ids.contains(rel.source), "unknown source {}", rel.source);
            assert!(ids.contains(rel.target), "unknown target {}", rel.target);
        }
    }
}
