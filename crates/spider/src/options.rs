use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Style handed to the host for the stick line layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StickStyle {
    pub color: String,
    /// Color used while the stick's member is hovered.
    pub hover_color: String,
    pub width: f64,
}

impl Default for StickStyle {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            hover_color: "red".to_string(),
            width: 1.0,
        }
    }
}

/// Options used to customize how clusters are expanded and rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpiderOptions {
    /// Member count above which the layout becomes a spiral instead of a circle.
    pub circle_spiral_switchover: usize,
    /// Minimum pixel distance between members and the cluster in circle layouts.
    pub min_circle_length: f64,
    /// Angular spacing term between consecutive spiral members.
    pub min_spiral_angle_separation: f64,
    /// Factor that grows the pixel distance of each member from the center.
    pub spiral_distance_factor: f64,
    /// Maximum number of leaves fetched and laid out for one cluster.
    pub max_features_in_web: usize,
    /// Collapse the layout after a member (or any point) is clicked.
    pub close_web_on_point_click: bool,
    pub stick_style: StickStyle,
    /// Whether the spider layers are displayed.
    pub visible: bool,
}

impl Default for SpiderOptions {
    fn default() -> Self {
        Self {
            circle_spiral_switchover: 6,
            min_circle_length: 30.0,
            min_spiral_angle_separation: 25.0,
            spiral_distance_factor: 5.0,
            max_features_in_web: 100,
            close_web_on_point_click: true,
            stick_style: StickStyle::default(),
            visible: true,
        }
    }
}

/// Names an option field, as reported by [`SpiderOptions::apply`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionField {
    CircleSpiralSwitchover,
    MinCircleLength,
    MinSpiralAngleSeparation,
    SpiralDistanceFactor,
    MaxFeaturesInWeb,
    CloseWebOnPointClick,
    StickStyle,
    Visible,
}

/// A partial options update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsPatch {
    pub circle_spiral_switchover: Option<usize>,
    pub min_circle_length: Option<f64>,
    pub min_spiral_angle_separation: Option<f64>,
    pub spiral_distance_factor: Option<f64>,
    pub max_features_in_web: Option<usize>,
    pub close_web_on_point_click: Option<bool>,
    pub stick_style: Option<StickStyle>,
    pub visible: Option<bool>,
}

impl OptionsPatch {
    /// Reads a loosely-typed JSON object, keeping only the fields that have the right type.
    ///
    /// Anything else (missing keys, wrong types, a non-object value) is skipped.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let count = |key: &str| obj.get(key).and_then(json_count);
        let number = |key: &str| obj.get(key).and_then(Value::as_f64);
        let flag = |key: &str| obj.get(key).and_then(Value::as_bool);

        Self {
            circle_spiral_switchover: count("circleSpiralSwitchover"),
            min_circle_length: number("minCircleLength"),
            min_spiral_angle_separation: number("minSpiralAngleSeparation"),
            spiral_distance_factor: number("spiralDistanceFactor"),
            max_features_in_web: count("maxFeaturesInWeb"),
            close_web_on_point_click: flag("closeWebOnPointClick"),
            stick_style: obj
                .get("stickStyle")
                .filter(|v| v.is_object())
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            visible: flag("visible"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Accepts non-negative integers, including integral floats such as `6.0`.
fn json_count(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= 0.0 && f <= usize::MAX as f64 {
        Some(f as usize)
    } else {
        None
    }
}

impl SpiderOptions {
    /// Applies `patch` field by field and returns the fields whose value changed.
    ///
    /// Out-of-range values are ignored individually; the rest of the patch still applies.
    pub fn apply(&mut self, patch: OptionsPatch) -> Vec<OptionField> {
        let mut changed = Vec::new();

        if let Some(v) = patch.circle_spiral_switchover {
            if v >= 1 {
                set(
                    &mut self.circle_spiral_switchover,
                    v,
                    OptionField::CircleSpiralSwitchover,
                    &mut changed,
                );
            } else {
                warn!(value = v, "ignoring circleSpiralSwitchover below 1");
            }
        }

        if let Some(v) = patch.min_circle_length {
            if positive(v) {
                set(&mut self.min_circle_length, v, OptionField::MinCircleLength, &mut changed);
            } else {
                warn!(value = v, "ignoring non-positive minCircleLength");
            }
        }

        if let Some(v) = patch.min_spiral_angle_separation {
            if positive(v) {
                set(
                    &mut self.min_spiral_angle_separation,
                    v,
                    OptionField::MinSpiralAngleSeparation,
                    &mut changed,
                );
            } else {
                warn!(value = v, "ignoring non-positive minSpiralAngleSeparation");
            }
        }

        if let Some(v) = patch.spiral_distance_factor {
            if positive(v) {
                set(
                    &mut self.spiral_distance_factor,
                    v,
                    OptionField::SpiralDistanceFactor,
                    &mut changed,
                );
            } else {
                warn!(value = v, "ignoring non-positive spiralDistanceFactor");
            }
        }

        if let Some(v) = patch.max_features_in_web {
            if v >= 1 {
                set(&mut self.max_features_in_web, v, OptionField::MaxFeaturesInWeb, &mut changed);
            } else {
                warn!(value = v, "ignoring maxFeaturesInWeb below 1");
            }
        }

        if let Some(v) = patch.close_web_on_point_click {
            set(
                &mut self.close_web_on_point_click,
                v,
                OptionField::CloseWebOnPointClick,
                &mut changed,
            );
        }

        if let Some(style) = patch.stick_style {
            if positive(style.width) {
                set(&mut self.stick_style, style, OptionField::StickStyle, &mut changed);
            } else {
                warn!(width = style.width, "ignoring stickStyle with non-positive width");
            }
        }

        if let Some(v) = patch.visible {
            set(&mut self.visible, v, OptionField::Visible, &mut changed);
        }

        changed
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn set<T: PartialEq>(slot: &mut T, value: T, field: OptionField, changed: &mut Vec<OptionField>) {
    if *slot != value {
        *slot = value;
        changed.push(field);
    }
}

#[cfg(test)]
mod tests {
    use super::{OptionField, OptionsPatch, SpiderOptions, StickStyle};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let o = SpiderOptions::default();
        assert_eq!(o.circle_spiral_switchover, 6);
        assert_eq!(o.min_circle_length, 30.0);
        assert_eq!(o.min_spiral_angle_separation, 25.0);
        assert_eq!(o.spiral_distance_factor, 5.0);
        assert_eq!(o.max_features_in_web, 100);
        assert!(o.close_web_on_point_click);
        assert!(o.visible);
    }

    #[test]
    fn partial_update_touches_only_given_fields() {
        let mut o = SpiderOptions::default();
        let changed = o.apply(OptionsPatch {
            min_circle_length: Some(50.0),
            ..OptionsPatch::default()
        });
        assert_eq!(changed, vec![OptionField::MinCircleLength]);
        assert_eq!(
            o,
            SpiderOptions {
                min_circle_length: 50.0,
                ..SpiderOptions::default()
            }
        );
    }

    #[test]
    fn out_of_range_fields_are_skipped_individually() {
        let mut o = SpiderOptions::default();
        let changed = o.apply(OptionsPatch {
            circle_spiral_switchover: Some(0),
            min_circle_length: Some(-3.0),
            spiral_distance_factor: Some(f64::NAN),
            max_features_in_web: Some(12),
            ..OptionsPatch::default()
        });
        assert_eq!(changed, vec![OptionField::MaxFeaturesInWeb]);
        assert_eq!(o.circle_spiral_switchover, 6);
        assert_eq!(o.min_circle_length, 30.0);
        assert_eq!(o.spiral_distance_factor, 5.0);
        assert_eq!(o.max_features_in_web, 12);
    }

    #[test]
    fn unchanged_values_are_not_reported() {
        let mut o = SpiderOptions::default();
        let changed = o.apply(OptionsPatch {
            visible: Some(true),
            circle_spiral_switchover: Some(6),
            ..OptionsPatch::default()
        });
        assert!(changed.is_empty());
    }

    #[test]
    fn json_patch_ignores_wrong_types() {
        let patch = OptionsPatch::from_json(&json!({
            "circleSpiralSwitchover": "ten",
            "minCircleLength": 42,
            "maxFeaturesInWeb": 20.0,
            "closeWebOnPointClick": 0,
            "visible": false,
            "stickStyle": "blue",
            "unknownField": true
        }));
        assert_eq!(
            patch,
            OptionsPatch {
                min_circle_length: Some(42.0),
                max_features_in_web: Some(20),
                visible: Some(false),
                ..OptionsPatch::default()
            }
        );
    }

    #[test]
    fn json_stick_style_fills_missing_fields_with_defaults() {
        let patch = OptionsPatch::from_json(&json!({ "stickStyle": { "color": "#333" } }));
        assert_eq!(
            patch.stick_style,
            Some(StickStyle {
                color: "#333".to_string(),
                ..StickStyle::default()
            })
        );
    }

    #[test]
    fn non_object_json_is_an_empty_patch() {
        assert!(OptionsPatch::from_json(&json!([1, 2, 3])).is_empty());
        assert!(OptionsPatch::from_json(&json!(null)).is_empty());
    }

    #[test]
    fn options_serialize_camel_case() {
        let v = serde_json::to_value(SpiderOptions::default()).expect("serialize");
        assert_eq!(v["circleSpiralSwitchover"], json!(6));
        assert_eq!(v["stickStyle"]["hoverColor"], json!("red"));
    }
}
