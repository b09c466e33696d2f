//! Gradient-boosted tree ensemble in the XGBoost JSON model format
//!
//! Supports `multi:softprob` / `multi:softmax` models with a `gbtree`
//! booster. Each class owns the trees tagged with its index in `tree_info`;
//! a row's class margin is the base score plus the sum of its trees' leaf
//! values, and probabilities are the softmax of the margins.
//!
//! Routing follows XGBoost: `x[split] < condition` goes left, a missing
//! (NaN) value follows `default_left`, and a node whose left child is `-1`
//! is a leaf whose value is stored in `split_conditions`.

use crate::classifier::ProbabilisticClassifier;
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use veriscan_core::{ClassProbabilities, Error, FeatureVector, Result};

/// Number of output classes: human, ai, over-polished
pub const NUM_CLASSES: usize = 3;

#[derive(Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Deserialize)]
struct Learner {
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: Objective,
}

#[derive(Deserialize)]
struct GradientBooster {
    name: String,
    model: Option<TreeModel>,
}

#[derive(Deserialize)]
struct TreeModel {
    trees: Vec<TreeJson>,
    tree_info: Vec<usize>,
}

#[derive(Deserialize)]
struct TreeJson {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
}

/// `default_left` is written as 0/1 integers by some versions and booleans by others
#[derive(Deserialize, Clone, Copy)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

#[derive(Deserialize)]
struct LearnerModelParam {
    num_class: String,
    num_feature: String,
    #[serde(default)]
    base_score: Option<String>,
}

#[derive(Deserialize)]
struct Objective {
    name: String,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f32,
    default_left: bool,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_json(tree: TreeJson, num_features: usize, id: usize) -> Result<Self> {
        let n = tree.left_children.len();
        if n == 0
            || tree.right_children.len() != n
            || tree.split_indices.len() != n
            || tree.split_conditions.len() != n
            || tree.default_left.len() != n
        {
            return Err(Error::classifier(format!(
                "Tree {} has inconsistent node arrays",
                id
            )));
        }

        let in_range = |child: i32| child == -1 || (child >= 0 && (child as usize) < n);
        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (tree.left_children[i], tree.right_children[i]);
            let feature = tree.split_indices[i] as usize;
            if !in_range(left) || !in_range(right) {
                return Err(Error::classifier(format!(
                    "Tree {} node {} has an out-of-range child",
                    id, i
                )));
            }
            if left != -1 && feature >= num_features {
                return Err(Error::classifier(format!(
                    "Tree {} node {} splits on feature {} but the model has {}",
                    id, i, feature, num_features
                )));
            }
            nodes.push(Node {
                left,
                right,
                feature,
                threshold: tree.split_conditions[i],
                default_left: tree.default_left[i].is_set(),
            });
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, row: &[f32]) -> Result<f32> {
        let mut idx = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            let node = self.nodes[idx];
            if node.left == -1 {
                return Ok(node.threshold);
            }

            let value = row[node.feature];
            let go_left = if value.is_nan() {
                node.default_left
            } else {
                value < node.threshold
            };

            let next = if go_left { node.left } else { node.right };
            if next < 0 {
                break;
            }
            idx = next as usize;
        }
        Err(Error::classifier("Tree traversal did not reach a leaf"))
    }
}

/// Pretrained XGBoost multiclass model
#[derive(Debug, Clone)]
pub struct GradientBoostedClassifier {
    name: String,
    trees: Vec<(usize, Tree)>,
    base_margin: [f32; NUM_CLASSES],
    num_features: usize,
}

impl GradientBoostedClassifier {
    /// Load from an XGBoost JSON model file.
    ///
    /// A missing file is `BackendUnavailable`; a malformed one is a
    /// classifier error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::backend_unavailable(format!(
                "Classifier model not found at {:?}",
                path
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let mut classifier = Self::from_json(&content)?;
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            classifier.name = stem.to_string();
        }

        info!(
            path = %path.display(),
            trees = classifier.trees.len(),
            num_features = classifier.num_features,
            "Classifier model loaded"
        );
        Ok(classifier)
    }

    /// Parse an XGBoost JSON model document
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json)
            .map_err(|e| Error::classifier(format!("Failed to parse classifier model: {}", e)))?;
        let learner = file.learner;

        if !learner.objective.name.starts_with("multi:soft") {
            return Err(Error::classifier(format!(
                "Unsupported objective {}, expected multi:softprob",
                learner.objective.name
            )));
        }

        let num_class = parse_count(&learner.learner_model_param.num_class, "num_class")?;
        if num_class != NUM_CLASSES {
            return Err(Error::classifier(format!(
                "Expected {} classes, model has {}",
                NUM_CLASSES, num_class
            )));
        }

        let num_features = parse_count(&learner.learner_model_param.num_feature, "num_feature")?;
        let base_margin = parse_base_score(learner.learner_model_param.base_score.as_deref())?;

        let booster = learner.gradient_booster;
        let model = match (booster.name.as_str(), booster.model) {
            ("gbtree", Some(model)) => model,
            (name, _) => {
                return Err(Error::classifier(format!(
                    "Unsupported booster {}, expected gbtree",
                    name
                )))
            }
        };

        if model.trees.len() != model.tree_info.len() {
            return Err(Error::classifier("tree_info length does not match trees"));
        }

        let trees = model
            .trees
            .into_iter()
            .zip(model.tree_info)
            .enumerate()
            .map(|(id, (tree, class))| {
                if class >= NUM_CLASSES {
                    return Err(Error::classifier(format!(
                        "Tree {} belongs to unknown class {}",
                        id, class
                    )));
                }
                Ok((class, Tree::from_json(tree, num_features, id)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: "xgboost".to_string(),
            trees,
            base_margin,
            num_features,
        })
    }

    fn predict_row(&self, row: &[f32]) -> Result<ClassProbabilities> {
        let mut margins = self.base_margin;
        for (class, tree) in &self.trees {
            margins[*class] += tree.leaf_value(row)?;
        }

        let [human, ai, over_polished] = softmax(margins);
        Ok(ClassProbabilities::new(human, ai, over_polished))
    }
}

impl ProbabilisticClassifier for GradientBoostedClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn predict_probabilities(&self, rows: &[FeatureVector]) -> Result<Vec<ClassProbabilities>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.num_features {
                    return Err(Error::classifier(format!(
                        "Feature row has width {}, model expects {}",
                        row.len(),
                        self.num_features
                    )));
                }
                self.predict_row(row.as_slice())
            })
            .collect()
    }
}

fn parse_count(value: &str, field: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::classifier(format!("Invalid {}: {:?}", field, value)))
}

/// `base_score` is a scalar string ("5E-1") or, in newer exports, a
/// bracketed per-class list ("[5E-1,5E-1,5E-1]")
fn parse_base_score(value: Option<&str>) -> Result<[f32; NUM_CLASSES]> {
    let Some(raw) = value else {
        return Ok([0.5; NUM_CLASSES]);
    };

    let parsed: Vec<f32> = raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::classifier(format!("Invalid base_score: {:?}", raw)))?;

    match parsed.as_slice() {
        [single] => Ok([*single; NUM_CLASSES]),
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(Error::classifier(format!("Invalid base_score: {:?}", raw))),
    }
}

fn softmax(margins: [f32; NUM_CLASSES]) -> [f32; NUM_CLASSES] {
    let max = margins.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp = margins.map(|m| (m - max).exp());
    let sum: f32 = exp.iter().sum();
    exp.map(|e| e / sum)
}
