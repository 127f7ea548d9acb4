//! Static registry of the hosted prediction models.
//!
//! Each entry maps a foundry/process pair to the identifier and tag of the
//! model serving it. Versions advance server-side; the rows here mirror
//! the published model table and only need updating when a new process is
//! onboarded or a model is retagged.

use serde::{Deserialize, Serialize};

/// A hosted model, keyed by the fabrication process it was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Fabrication facility the model is trained for.
    pub foundry: String,
    /// Material process within the foundry.
    pub process: String,
    /// Latest model version label.
    pub version: String,
    /// Version of the SEM dataset the model was trained on.
    pub dataset: String,
    /// Identifier the remote service keys models by.
    pub name: String,
    /// Tag selecting the trained snapshot of the model.
    pub tag: String,
}

impl Model {
    /// Look up a registry entry by model name, e.g. `"ANT_NanoSOI"`.
    pub fn get_by_name(name: &str) -> Option<Model> {
        registry().into_iter().find(|model| model.name == name)
    }

    /// Look up a registry entry by foundry and process labels.
    pub fn get_by_process(foundry: &str, process: &str) -> Option<Model> {
        registry()
            .into_iter()
            .find(|model| model.foundry == foundry && model.process == process)
    }

    /// Tags submitted alongside the model name on a prediction request.
    pub fn request_tags(&self) -> Vec<String> {
        vec![self.tag.clone()]
    }
}

/// All published models, in display order.
pub fn registry() -> Vec<Model> {
    vec![
        Model {
            foundry: "ANT".to_string(),
            process: "NanoSOI".to_string(),
            version: "v5".to_string(),
            dataset: "d4".to_string(),
            name: "ANT_NanoSOI".to_string(),
            tag: "v5-d4".to_string(),
        },
        Model {
            foundry: "ANT".to_string(),
            process: "NanoSOI (air cladding)".to_string(),
            version: "v9".to_string(),
            dataset: "d10".to_string(),
            name: "ANT_NanoSOI_ANF1".to_string(),
            tag: "v9-d10".to_string(),
        },
        Model {
            foundry: "ANT".to_string(),
            process: "SiN".to_string(),
            version: "v1".to_string(),
            dataset: "d1".to_string(),
            name: "ANT_SiN".to_string(),
            tag: "v1-d1".to_string(),
        },
    ]
}
