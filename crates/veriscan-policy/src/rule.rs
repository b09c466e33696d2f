//! Sentence labeling rules
//!
//! Rules are evaluated in order and the first one that applies decides the
//! label. Order and thresholds are product policy: moving a rule changes
//! outcomes at the boundaries.

use serde::Serialize;
use veriscan_core::{Label, PercentScores};

/// One rung of the ladder
#[derive(Clone, Copy)]
pub struct LabelRule {
    /// Stable rule name, reported with each decision
    pub name: &'static str,

    /// Whether this rule decides the label
    pub applies: fn(&PercentScores) -> bool,

    /// The label when it applies
    pub label: fn(&PercentScores) -> Label,
}

impl std::fmt::Debug for LabelRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelRule").field("name", &self.name).finish()
    }
}

/// Label plus the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub label: Label,
    pub rule: &'static str,
}

fn ai(_: &PercentScores) -> Label {
    Label::Ai
}

fn human(_: &PercentScores) -> Label {
    Label::Human
}

fn larger_of_ai_and_human(s: &PercentScores) -> Label {
    if s.ai > s.human {
        Label::Ai
    } else {
        Label::Human
    }
}

/// The production ladder
const STANDARD_RULES: [LabelRule; 6] = [
    LabelRule {
        name: "ai_dominant",
        applies: |s| s.ai >= 20.0 && s.ai > s.human,
        label: ai,
    },
    LabelRule {
        name: "heavily_polished",
        applies: |s| s.polish >= 95.0,
        label: ai,
    },
    LabelRule {
        name: "lightly_polished",
        applies: |s| s.polish < 90.0,
        label: larger_of_ai_and_human,
    },
    LabelRule {
        name: "human_margin",
        applies: |s| s.human >= s.ai + 10.0,
        label: human,
    },
    LabelRule {
        name: "ai_floor",
        applies: |s| s.ai >= 12.0,
        label: ai,
    },
    LabelRule {
        name: "default_human",
        applies: |_| true,
        label: human,
    },
];

/// Ordered first-match-wins rule ladder
#[derive(Debug, Clone)]
pub struct LabelingPolicy {
    rules: Vec<LabelRule>,
}

impl Default for LabelingPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl LabelingPolicy {
    /// The production ladder:
    ///
    /// 1. `ai >= 20` and `ai > human` -> AI
    /// 2. `polish >= 95` -> AI
    /// 3. `polish < 90` -> AI if `ai > human`, else Human
    /// 4. `human >= ai + 10` -> Human
    /// 5. `ai >= 12` -> AI
    /// 6. otherwise Human
    pub fn standard() -> Self {
        Self {
            rules: STANDARD_RULES.to_vec(),
        }
    }

    /// A custom ladder. If no rule applies the label is Human.
    pub fn with_rules(rules: Vec<LabelRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[LabelRule] {
        &self.rules
    }

    /// Decide a label for percent-scaled scores
    pub fn evaluate(&self, scores: &PercentScores) -> Decision {
        self.rules
            .iter()
            .find(|rule| (rule.applies)(scores))
            .map(|rule| Decision {
                label: (rule.label)(scores),
                rule: rule.name,
            })
            .unwrap_or(Decision {
                label: Label::Human,
                rule: "no_rule",
            })
    }

    pub fn label(&self, scores: &PercentScores) -> Label {
        self.evaluate(scores).label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decide(ai: f64, human: f64, polish: f64) -> Decision {
        LabelingPolicy::standard().evaluate(&PercentScores::new(human, ai, polish))
    }

    #[test]
    fn test_rule_boundaries() {
        let cases = [
            ((25.0, 10.0, 50.0), Label::Ai, "ai_dominant"),
            ((5.0, 90.0, 96.0), Label::Ai, "heavily_polished"),
            ((40.0, 50.0, 85.0), Label::Human, "lightly_polished"),
            ((30.0, 45.0, 92.0), Label::Human, "human_margin"),
            ((13.0, 10.0, 92.0), Label::Ai, "ai_floor"),
            ((5.0, 5.0, 92.0), Label::Human, "default_human"),
        ];

        for ((ai, human, polish), label, rule) in cases {
            let decision = decide(ai, human, polish);
            assert_eq!(decision.label, label, "({ai}, {human}, {polish})");
            assert_eq!(decision.rule, rule, "({ai}, {human}, {polish})");
        }
    }

    #[test]
    fn test_lightly_polished_with_ai_ahead() {
        // ai > human but ai < 20, so rule 1 is skipped and rule 3 decides
        let decision = decide(15.0, 10.0, 85.0);
        assert_eq!(decision.label, Label::Ai);
        assert_eq!(decision.rule, "lightly_polished");
    }

    #[test]
    fn test_exact_thresholds() {
        assert_eq!(decide(20.0, 19.99, 0.0).rule, "ai_dominant");
        assert_eq!(decide(20.0, 20.0, 95.0).rule, "heavily_polished");
        assert_eq!(decide(1.0, 11.0, 90.0).rule, "human_margin");
        assert_eq!(decide(12.0, 21.99, 90.0).rule, "ai_floor");
        assert_eq!(decide(11.99, 21.0, 90.0).rule, "default_human");
    }

    #[test]
    fn test_custom_ladder_falls_back_to_human() {
        let policy = LabelingPolicy::with_rules(vec![LabelRule {
            name: "never",
            applies: |_| false,
            label: ai,
        }]);
        let decision = policy.evaluate(&PercentScores::new(1.0, 99.0, 0.0));
        assert_eq!(decision.label, Label::Human);
        assert_eq!(decision.rule, "no_rule");
    }

    proptest! {
        #[test]
        fn evaluation_is_pure(ai in 0.0f64..100.0, human in 0.0f64..100.0, polish in 0.0f64..100.0) {
            let scores = PercentScores::new(human, ai, polish);
            let policy = LabelingPolicy::standard();
            prop_assert_eq!(policy.evaluate(&scores), policy.evaluate(&scores));
        }
    }
}
