//! Effect catalogue.
//!
//! Every effect has a fixed parameter schema, belongs to one plane and
//! consumes a fixed number of inputs. Lowering an effect produces the filter
//! stages the builder links into the graph; parameter ranges are checked
//! here so a bad value fails at compile time instead of inside ffmpeg.

use serde::{Deserialize, Serialize};

use super::builder::FilterRequest;
use super::error::{GraphError, GraphResult};
use super::node::{FilterStage, Pad};
use crate::models::StreamKind;

/// Fade direction for `fade` / `afade`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeDirection {
    In,
    Out,
}

impl FadeDirection {
    fn as_str(&self) -> &'static str {
        match self {
            FadeDirection::In => "in",
            FadeDirection::Out => "out",
        }
    }
}

/// How long an `amix` output lasts relative to its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixDuration {
    #[default]
    Longest,
    Shortest,
    First,
}

impl MixDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            MixDuration::Longest => "longest",
            MixDuration::Shortest => "shortest",
            MixDuration::First => "first",
        }
    }
}

/// A typed effect request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    // Audio
    /// Linear gain.
    Volume { factor: f64 },
    /// Audio fade in or out.
    AudioFade {
        direction: FadeDirection,
        #[serde(default)]
        start: f64,
        duration: f64,
    },
    /// Three-band equalizer: gains in dB at 32 Hz, 1 kHz and 5 kHz.
    Equalizer {
        #[serde(default)]
        low: f64,
        #[serde(default)]
        mid: f64,
        #[serde(default)]
        high: f64,
    },
    Echo {
        #[serde(default = "default_echo_in_gain")]
        in_gain: f64,
        #[serde(default = "default_echo_out_gain")]
        out_gain: f64,
        delay_ms: u32,
        decay: f64,
    },
    HighPass { frequency: f64 },
    LowPass { frequency: f64 },
    /// Delay every channel by the same amount.
    Delay { milliseconds: u64 },
    /// Tempo change without pitch shift.
    Tempo { factor: f64 },

    // Video
    Fade {
        direction: FadeDirection,
        #[serde(default)]
        start: f64,
        duration: f64,
    },
    /// Brightness, contrast, saturation and gamma through `eq`.
    ColorAdjust {
        #[serde(default)]
        brightness: f64,
        #[serde(default = "one")]
        contrast: f64,
        #[serde(default = "one")]
        saturation: f64,
        #[serde(default = "one")]
        gamma: f64,
    },
    Hue {
        degrees: f64,
        #[serde(default = "one")]
        saturation: f64,
    },
    Grayscale,
    Sharpen { amount: f64 },
    Blur { radius: u32 },
    Denoise,
    /// Resize; `-1` / `-2` keep the aspect ratio.
    Scale { width: i32, height: i32 },
    FrameRate { fps: f64 },
    /// Playback speed of the video plane (`2.0` plays twice as fast).
    Speed { factor: f64 },
    /// Burned-in text, optionally limited to a time window.
    Text {
        text: String,
        #[serde(default = "default_text_position")]
        x: String,
        #[serde(default = "default_text_position")]
        y: String,
        #[serde(default = "default_font_size")]
        font_size: u32,
        #[serde(default = "default_font_color")]
        color: String,
        #[serde(default)]
        start: Option<f64>,
        #[serde(default)]
        end: Option<f64>,
    },
    Rotate { degrees: f64 },

    // Multi-input
    /// Composite the second video input over the first.
    Overlay { x: String, y: String },
    /// Mix `inputs` audio streams into one.
    Mix {
        inputs: usize,
        #[serde(default)]
        duration: MixDuration,
    },
}

fn one() -> f64 {
    1.0
}

fn default_echo_in_gain() -> f64 {
    0.8
}

fn default_echo_out_gain() -> f64 {
    0.9
}

fn default_text_position() -> String {
    "10".to_string()
}

fn default_font_size() -> u32 {
    24
}

fn default_font_color() -> String {
    "white".to_string()
}

/// Center frequencies of the three equalizer bands.
const EQ_BANDS: [u32; 3] = [32, 1000, 5000];

impl Effect {
    /// Plane of the effect's inputs and output.
    pub fn kind(&self) -> StreamKind {
        match self {
            Effect::Volume { .. }
            | Effect::AudioFade { .. }
            | Effect::Equalizer { .. }
            | Effect::Echo { .. }
            | Effect::HighPass { .. }
            | Effect::LowPass { .. }
            | Effect::Delay { .. }
            | Effect::Tempo { .. }
            | Effect::Mix { .. } => StreamKind::Audio,
            _ => StreamKind::Video,
        }
    }

    /// Number of input pads the effect consumes.
    pub fn arity(&self) -> usize {
        match self {
            Effect::Overlay { .. } => 2,
            Effect::Mix { inputs, .. } => *inputs,
            _ => 1,
        }
    }

    /// Name of the primary filter.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Volume { .. } => "volume",
            Effect::AudioFade { .. } => "afade",
            Effect::Equalizer { .. } => "equalizer",
            Effect::Echo { .. } => "aecho",
            Effect::HighPass { .. } => "highpass",
            Effect::LowPass { .. } => "lowpass",
            Effect::Delay { .. } => "adelay",
            Effect::Tempo { .. } => "atempo",
            Effect::Fade { .. } => "fade",
            Effect::ColorAdjust { .. } => "eq",
            Effect::Hue { .. } | Effect::Grayscale => "hue",
            Effect::Sharpen { .. } => "unsharp",
            Effect::Blur { .. } => "boxblur",
            Effect::Denoise => "hqdn3d",
            Effect::Scale { .. } => "scale",
            Effect::FrameRate { .. } => "fps",
            Effect::Speed { .. } => "setpts",
            Effect::Text { .. } => "drawtext",
            Effect::Rotate { .. } => "rotate",
            Effect::Overlay { .. } => "overlay",
            Effect::Mix { .. } => "amix",
        }
    }

    /// Lower to filter stages, checking parameter ranges.
    pub fn stages(&self) -> GraphResult<Vec<FilterStage>> {
        let name = self.name();
        let stage = FilterStage::new(name);

        let stages = match self {
            Effect::Volume { factor } => {
                let factor = non_negative(name, "factor", *factor)?;
                vec![stage.param("volume", factor)]
            }
            Effect::AudioFade {
                direction,
                start,
                duration,
            }
            | Effect::Fade {
                direction,
                start,
                duration,
            } => {
                let start = non_negative(name, "start", *start)?;
                let duration = positive(name, "duration", *duration)?;
                vec![stage
                    .param("t", direction.as_str())
                    .param("st", start)
                    .param("d", duration)]
            }
            Effect::Equalizer { low, mid, high } => {
                let mut bands = Vec::with_capacity(EQ_BANDS.len());
                for (freq, gain) in EQ_BANDS.iter().zip([*low, *mid, *high]) {
                    let gain = in_range(name, "gain", gain, -900.0, 900.0)?;
                    bands.push(
                        FilterStage::new(name)
                            .param("f", freq)
                            .param("width_type", "h")
                            .param("width", 1)
                            .param("g", gain),
                    );
                }
                bands
            }
            Effect::Echo {
                in_gain,
                out_gain,
                delay_ms,
                decay,
            } => {
                let in_gain = in_range(name, "in_gain", *in_gain, 0.0, 1.0)?;
                let out_gain = in_range(name, "out_gain", *out_gain, 0.0, 1.0)?;
                let decay = in_range(name, "decay", *decay, 0.0, 1.0)?;
                if *delay_ms == 0 {
                    return Err(GraphError::invalid_parameter(name, "delay_ms must be > 0"));
                }
                vec![stage
                    .param("in_gain", in_gain)
                    .param("out_gain", out_gain)
                    .param("delays", delay_ms)
                    .param("decays", decay)]
            }
            Effect::HighPass { frequency } | Effect::LowPass { frequency } => {
                let frequency = positive(name, "frequency", *frequency)?;
                vec![stage.param("f", frequency)]
            }
            Effect::Delay { milliseconds } => {
                vec![stage.param("delays", format!("{0}|{0}", milliseconds))]
            }
            Effect::Tempo { factor } => {
                let factor = in_range(name, "factor", *factor, 0.5, 100.0)?;
                vec![stage.param("tempo", factor)]
            }
            Effect::ColorAdjust {
                brightness,
                contrast,
                saturation,
                gamma,
            } => {
                let brightness = in_range(name, "brightness", *brightness, -1.0, 1.0)?;
                let contrast = in_range(name, "contrast", *contrast, -1000.0, 1000.0)?;
                let saturation = in_range(name, "saturation", *saturation, 0.0, 3.0)?;
                let gamma = in_range(name, "gamma", *gamma, 0.1, 10.0)?;
                vec![stage
                    .param("brightness", brightness)
                    .param("contrast", contrast)
                    .param("saturation", saturation)
                    .param("gamma", gamma)]
            }
            Effect::Hue {
                degrees,
                saturation,
            } => {
                let degrees = finite(name, "degrees", *degrees)?;
                let saturation = in_range(name, "saturation", *saturation, -10.0, 10.0)?;
                vec![stage.param("h", degrees).param("s", saturation)]
            }
            Effect::Grayscale => vec![stage.param("s", 0)],
            Effect::Sharpen { amount } => {
                let amount = in_range(name, "amount", *amount, -2.0, 5.0)?;
                vec![stage
                    .param("luma_msize_x", 5)
                    .param("luma_msize_y", 5)
                    .param("luma_amount", amount)]
            }
            Effect::Blur { radius } => {
                if *radius == 0 {
                    return Err(GraphError::invalid_parameter(name, "radius must be > 0"));
                }
                vec![stage.param("luma_radius", radius).param("luma_power", 1)]
            }
            Effect::Denoise => vec![stage],
            Effect::Scale { width, height } => {
                for (key, value) in [("width", *width), ("height", *height)] {
                    if value == 0 || value < -2 {
                        return Err(GraphError::invalid_parameter(
                            name,
                            format!("{} must be positive, -1 or -2 (got {})", key, value),
                        ));
                    }
                }
                if *width < 0 && *height < 0 {
                    return Err(GraphError::invalid_parameter(
                        name,
                        "width and height cannot both be derived",
                    ));
                }
                vec![stage.param("w", width).param("h", height)]
            }
            Effect::FrameRate { fps } => {
                let fps = positive(name, "fps", *fps)?;
                vec![stage.param("fps", fps)]
            }
            Effect::Speed { factor } => {
                let factor = positive(name, "factor", *factor)?;
                vec![stage.param("expr", format!("PTS/{}", factor))]
            }
            Effect::Text {
                text,
                x,
                y,
                font_size,
                color,
                start,
                end,
            } => {
                if *font_size == 0 {
                    return Err(GraphError::invalid_parameter(name, "font_size must be > 0"));
                }
                let mut stage = stage
                    .param("text", text)
                    .param("x", x)
                    .param("y", y)
                    .param("fontsize", font_size)
                    .param("fontcolor", color);
                if let Some(enable) = text_window(name, *start, *end)? {
                    stage = stage.param("enable", enable);
                }
                vec![stage]
            }
            Effect::Rotate { degrees } => {
                let degrees = finite(name, "degrees", *degrees)?;
                vec![stage.param("a", format!("{}*PI/180", degrees))]
            }
            Effect::Overlay { x, y } => vec![stage.param("x", x).param("y", y)],
            Effect::Mix { inputs, duration } => {
                if *inputs == 0 {
                    return Err(GraphError::invalid_parameter(name, "inputs must be > 0"));
                }
                vec![stage
                    .param("inputs", inputs)
                    .param("duration", duration.as_str())]
            }
        };

        Ok(stages)
    }

    /// Build a builder request fed by `inputs`.
    pub fn to_request(&self, inputs: &[Pad]) -> GraphResult<FilterRequest> {
        if let Some(pad) = inputs.iter().find(|p| p.kind() != self.kind()) {
            return Err(GraphError::PlaneMismatch {
                filter: self.name().to_string(),
                expected: self.kind(),
                found: pad.kind(),
            });
        }

        let mut stages = self.stages()?.into_iter();
        let Some(primary) = stages.next() else {
            return Err(GraphError::EmptyChain);
        };
        let request = stages
            .fold(
                FilterRequest::new(self.kind(), primary, self.arity()),
                FilterRequest::then,
            )
            .inputs(inputs.iter().copied());
        Ok(request)
    }
}

fn finite(filter: &str, key: &str, value: f64) -> GraphResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GraphError::invalid_parameter(
            filter,
            format!("{} must be a finite number", key),
        ))
    }
}

fn non_negative(filter: &str, key: &str, value: f64) -> GraphResult<f64> {
    let value = finite(filter, key, value)?;
    if value < 0.0 {
        return Err(GraphError::invalid_parameter(
            filter,
            format!("{} must be >= 0 (got {})", key, value),
        ));
    }
    Ok(value)
}

fn positive(filter: &str, key: &str, value: f64) -> GraphResult<f64> {
    let value = finite(filter, key, value)?;
    if value <= 0.0 {
        return Err(GraphError::invalid_parameter(
            filter,
            format!("{} must be > 0 (got {})", key, value),
        ));
    }
    Ok(value)
}

fn in_range(filter: &str, key: &str, value: f64, min: f64, max: f64) -> GraphResult<f64> {
    let value = finite(filter, key, value)?;
    if value < min || value > max {
        return Err(GraphError::invalid_parameter(
            filter,
            format!("{} must be within {}..={} (got {})", key, min, max, value),
        ));
    }
    Ok(value)
}

/// `enable` expression for a drawtext time window.
fn text_window(filter: &str, start: Option<f64>, end: Option<f64>) -> GraphResult<Option<String>> {
    let start = start.map(|s| non_negative(filter, "start", s)).transpose()?;
    let end = end.map(|e| non_negative(filter, "end", e)).transpose()?;

    Ok(match (start, end) {
        (Some(s), Some(e)) if e <= s => {
            return Err(GraphError::invalid_parameter(
                filter,
                format!("end ({}) must be after start ({})", e, s),
            ))
        }
        (Some(s), Some(e)) => Some(format!("between(t,{},{})", s, e)),
        (Some(s), None) => Some(format!("gte(t,{})", s)),
        (None, Some(e)) => Some(format!("lte(t,{})", e)),
        (None, None) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(effect: &Effect) -> String {
        effect
            .stages()
            .unwrap()
            .iter()
            .map(FilterStage::to_graph_text)
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn audio_effects_lower_to_expected_filters() {
        assert_eq!(render(&Effect::Volume { factor: 1.5 }), "volume=volume=1.5");
        assert_eq!(
            render(&Effect::Delay { milliseconds: 1150 }),
            "adelay=delays=1150|1150"
        );
        assert_eq!(render(&Effect::HighPass { frequency: 200.0 }), "highpass=f=200");
        assert_eq!(
            render(&Effect::Echo {
                in_gain: 0.8,
                out_gain: 0.9,
                delay_ms: 1000,
                decay: 0.3,
            }),
            "aecho=in_gain=0.8:out_gain=0.9:delays=1000:decays=0.3"
        );
    }

    #[test]
    fn equalizer_emits_one_stage_per_band() {
        let stages = Effect::Equalizer {
            low: 3.0,
            mid: 0.0,
            high: -2.0,
        }
        .stages()
        .unwrap();
        assert_eq!(stages.len(), 3);
        assert_eq!(
            stages[0].to_graph_text(),
            "equalizer=f=32:width_type=h:width=1:g=3"
        );
        assert_eq!(stages[2].get("f"), Some("5000"));
        assert_eq!(stages[2].get("g"), Some("-2"));
    }

    #[test]
    fn video_effects_lower_to_expected_filters() {
        assert_eq!(render(&Effect::Grayscale), "hue=s=0");
        assert_eq!(render(&Effect::Denoise), "hqdn3d");
        assert_eq!(
            render(&Effect::Scale {
                width: 1280,
                height: -2
            }),
            "scale=w=1280:h=-2"
        );
        assert_eq!(render(&Effect::Speed { factor: 2.0 }), "setpts=expr=PTS/2");
        assert_eq!(render(&Effect::Rotate { degrees: 90.0 }), "rotate=a=90*PI/180");
        assert_eq!(
            render(&Effect::ColorAdjust {
                brightness: 0.1,
                contrast: 1.2,
                saturation: 1.0,
                gamma: 1.0,
            }),
            "eq=brightness=0.1:contrast=1.2:saturation=1:gamma=1"
        );
    }

    #[test]
    fn text_window_is_escaped_for_the_graph() {
        let effect = Effect::Text {
            text: "Hi".to_string(),
            x: "10".to_string(),
            y: "10".to_string(),
            font_size: 24,
            color: "white".to_string(),
            start: Some(1.0),
            end: Some(2.5),
        };
        assert_eq!(
            render(&effect),
            "drawtext=text=Hi:x=10:y=10:fontsize=24:fontcolor=white:enable=between(t\\,1\\,2.5)"
        );
    }

    #[test]
    fn text_window_must_be_ordered() {
        let effect = Effect::Text {
            text: "Hi".to_string(),
            x: "0".to_string(),
            y: "0".to_string(),
            font_size: 24,
            color: "white".to_string(),
            start: Some(3.0),
            end: Some(1.0),
        };
        assert!(matches!(
            effect.stages(),
            Err(GraphError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let bad = [
            Effect::Volume { factor: -1.0 },
            Effect::Volume { factor: f64::NAN },
            Effect::Tempo { factor: 0.25 },
            Effect::Speed { factor: 0.0 },
            Effect::Blur { radius: 0 },
            Effect::Scale {
                width: -1,
                height: -1,
            },
            Effect::Mix {
                inputs: 0,
                duration: MixDuration::Longest,
            },
            Effect::AudioFade {
                direction: FadeDirection::In,
                start: 0.0,
                duration: 0.0,
            },
        ];
        for effect in bad {
            assert!(
                matches!(effect.stages(), Err(GraphError::InvalidParameter { .. })),
                "{:?} should be rejected",
                effect
            );
        }
    }

    #[test]
    fn kind_and_arity() {
        assert_eq!(Effect::Volume { factor: 1.0 }.kind(), StreamKind::Audio);
        assert_eq!(Effect::Grayscale.kind(), StreamKind::Video);
        let overlay = Effect::Overlay {
            x: "0".to_string(),
            y: "0".to_string(),
        };
        assert_eq!(overlay.arity(), 2);
        let mix = Effect::Mix {
            inputs: 3,
            duration: MixDuration::First,
        };
        assert_eq!(mix.arity(), 3);
        assert_eq!(render(&mix), "amix=inputs=3:duration=first");
    }

    #[test]
    fn request_rejects_wrong_plane() {
        let err = Effect::Grayscale.to_request(&[Pad::audio(0)]).unwrap_err();
        assert_eq!(
            err,
            GraphError::PlaneMismatch {
                filter: "hue".to_string(),
                expected: StreamKind::Video,
                found: StreamKind::Audio,
            }
        );
    }

    #[test]
    fn deserializes_from_tagged_json() {
        let effect: Effect =
            serde_json::from_str(r#"{"effect":"audio_fade","direction":"out","start":8,"duration":2}"#)
                .unwrap();
        assert_eq!(
            effect,
            Effect::AudioFade {
                direction: FadeDirection::Out,
                start: 8.0,
                duration: 2.0,
            }
        );

        let adjust: Effect =
            serde_json::from_str(r#"{"effect":"color_adjust","brightness":0.2}"#).unwrap();
        assert_eq!(render(&adjust), "eq=brightness=0.2:contrast=1:saturation=1:gamma=1");
    }
}
