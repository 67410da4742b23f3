//! Structured FFmpeg filter graphs.
//!
//! Graphs are assembled from typed [`Filter`] values, validated as data and
//! only rendered to FFmpeg's textual syntax at the end.

use std::collections::HashSet;
use std::fmt;

use crate::error::{MediaError, MediaResult};

/// How `scale` treats the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Stretch to exactly the requested size
    Exact,
    /// Fit inside the box, keeping aspect (letterbox with a following pad)
    Fit,
    /// Cover the box, keeping aspect (crop the overflow afterwards)
    Cover,
}

/// Length handling for `amix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixDuration {
    Longest,
    Shortest,
    First,
}

impl MixDuration {
    fn as_str(&self) -> &'static str {
        match self {
            MixDuration::Longest => "longest",
            MixDuration::Shortest => "shortest",
            MixDuration::First => "first",
        }
    }
}

/// A single FFmpeg filter with typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Scale { width: u32, height: u32, mode: ScaleMode },
    /// Centered pad to `width`x`height` with black bars
    Pad { width: u32, height: u32 },
    /// Centered crop
    Crop { width: u32, height: u32 },
    /// Force square pixels
    SetSar,
    Fps(u32),
    Format(String),
    /// Reset video timestamps to start at zero
    ResetPts,
    Trim { duration: f64 },
    /// Animated zoom and pan over a still frame
    ZoomPan {
        zoom: String,
        x: String,
        y: String,
        frames: u32,
        width: u32,
        height: u32,
        fps: u32,
    },
    XFade { transition: String, duration: f64, offset: f64 },
    Concat { segments: usize },
    Volume(f64),
    ATrim { duration: f64 },
    /// Reset audio timestamps to start at zero
    AResetPts,
    /// Delay every channel by the same amount
    ADelay { millis: u64 },
    AMix { inputs: usize, duration: MixDuration },
}

impl Filter {
    /// Check argument ranges before anything is rendered.
    pub fn validate(&self) -> MediaResult<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(MediaError::invalid_filter_graph(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )))
            }
        };
        let dimensions = |width: u32, height: u32| {
            if width == 0 || height == 0 {
                Err(MediaError::invalid_filter_graph(format!(
                    "dimensions must be non-zero, got {}x{}",
                    width, height
                )))
            } else {
                Ok(())
            }
        };

        match self {
            Filter::Scale { width, height, .. }
            | Filter::Pad { width, height }
            | Filter::Crop { width, height } => dimensions(*width, *height),
            Filter::Fps(fps) => positive("fps", *fps as f64),
            Filter::Format(format) if format.is_empty() => {
                Err(MediaError::invalid_filter_graph("empty pixel format"))
            }
            Filter::Trim { duration } => positive("trim duration", *duration),
            Filter::ATrim { duration } => positive("atrim duration", *duration),
            Filter::ZoomPan {
                frames,
                width,
                height,
                fps,
                ..
            } => {
                dimensions(*width, *height)?;
                positive("zoompan frames", *frames as f64)?;
                positive("zoompan fps", *fps as f64)
            }
            Filter::XFade { duration, offset, .. } => {
                positive("xfade duration", *duration)?;
                if offset.is_finite() && *offset >= 0.0 {
                    Ok(())
                } else {
                    Err(MediaError::invalid_filter_graph(format!(
                        "xfade offset must be non-negative, got {}",
                        offset
                    )))
                }
            }
            Filter::Concat { segments } => positive("concat segments", *segments as f64),
            Filter::Volume(volume) => {
                if volume.is_finite() && *volume >= 0.0 {
                    Ok(())
                } else {
                    Err(MediaError::invalid_filter_graph(format!("invalid volume {}", volume)))
                }
            }
            Filter::AMix { inputs, .. } if *inputs < 2 => Err(MediaError::invalid_filter_graph(
                format!("amix needs at least two inputs, got {}", inputs),
            )),
            _ => Ok(()),
        }
    }

    /// Number of unlabeled-or-labeled input pads the filter consumes.
    pub fn input_count(&self) -> usize {
        match self {
            Filter::XFade { .. } => 2,
            Filter::Concat { segments } => *segments,
            Filter::AMix { inputs, .. } => *inputs,
            _ => 1,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Scale { width, height, mode } => match mode {
                ScaleMode::Exact => write!(f, "scale={}:{}", width, height),
                ScaleMode::Fit => write!(
                    f,
                    "scale={}:{}:force_original_aspect_ratio=decrease",
                    width, height
                ),
                ScaleMode::Cover => write!(
                    f,
                    "scale={}:{}:force_original_aspect_ratio=increase",
                    width, height
                ),
            },
            Filter::Pad { width, height } => {
                write!(f, "pad={}:{}:(ow-iw)/2:(oh-ih)/2:color=black", width, height)
            }
            Filter::Crop { width, height } => write!(f, "crop={}:{}", width, height),
            Filter::SetSar => write!(f, "setsar=1"),
            Filter::Fps(fps) => write!(f, "fps={}", fps),
            Filter::Format(format) => write!(f, "format={}", format),
            Filter::ResetPts => write!(f, "setpts=PTS-STARTPTS"),
            Filter::Trim { duration } => write!(f, "trim=duration={:.3}", duration),
            Filter::ZoomPan {
                zoom,
                x,
                y,
                frames,
                width,
                height,
                fps,
            } => write!(
                f,
                "zoompan=z='{}':x='{}':y='{}':d={}:s={}x{}:fps={}",
                zoom, x, y, frames, width, height, fps
            ),
            Filter::XFade {
                transition,
                duration,
                offset,
            } => write!(
                f,
                "xfade=transition={}:duration={:.3}:offset={:.3}",
                transition, duration, offset
            ),
            Filter::Concat { segments } => write!(f, "concat=n={}:v=1:a=0", segments),
            Filter::Volume(volume) => write!(f, "volume={:.3}", volume),
            Filter::ATrim { duration } => write!(f, "atrim=duration={:.3}", duration),
            Filter::AResetPts => write!(f, "asetpts=PTS-STARTPTS"),
            Filter::ADelay { millis } => write!(f, "adelay=delays={}:all=1", millis),
            Filter::AMix { inputs, duration } => write!(
                f,
                "amix=inputs={}:duration={}:dropout_transition=0:normalize=0",
                inputs,
                duration.as_str()
            ),
        }
    }
}

/// A comma-separated run of filters between labeled pads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterChain {
    pub inputs: Vec<String>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, label: impl Into<String>) -> Self {
        self.inputs.push(label.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }

    /// Render without labels, for use with `-vf`.
    pub fn to_simple(&self) -> MediaResult<String> {
        if self.filters.is_empty() {
            return Err(MediaError::invalid_filter_graph("empty filter chain"));
        }
        for filter in &self.filters {
            filter.validate()?;
        }
        Ok(self.render_filters())
    }

    fn render_filters(&self) -> String {
        self.filters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.inputs {
            write!(f, "[{}]", label)?;
        }
        write!(f, "{}", self.render_filters())?;
        for label in &self.outputs {
            write!(f, "[{}]", label)?;
        }
        Ok(())
    }
}

/// A `-filter_complex` graph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGraph {
    pub chains: Vec<FilterChain>,
}

/// Labels referring to input streams, e.g. `0:v` or `3:a`.
fn is_stream_specifier(label: &str) -> bool {
    match label.split_once(':') {
        Some((index, kind)) => {
            !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) && matches!(kind, "v" | "a")
        }
        None => false,
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Check filters and label wiring.
    ///
    /// Every intermediate label must be produced before it is consumed and
    /// consumed exactly once; each chain's first filter must receive as many
    /// pads as it takes.
    pub fn validate(&self) -> MediaResult<()> {
        if self.chains.is_empty() {
            return Err(MediaError::invalid_filter_graph("graph has no chains"));
        }

        let mut produced: HashSet<&str> = HashSet::new();
        let mut consumed: HashSet<&str> = HashSet::new();

        for (idx, chain) in self.chains.iter().enumerate() {
            let Some(first) = chain.filters.first() else {
                return Err(MediaError::invalid_filter_graph(format!("chain {} is empty", idx)));
            };
            for filter in &chain.filters {
                filter.validate()?;
            }

            if chain.inputs.len() != first.input_count() {
                return Err(MediaError::invalid_filter_graph(format!(
                    "chain {} feeds {} pads into '{}' which takes {}",
                    idx,
                    chain.inputs.len(),
                    first,
                    first.input_count()
                )));
            }

            for label in &chain.inputs {
                if is_stream_specifier(label) {
                    continue;
                }
                if !produced.contains(label.as_str()) {
                    return Err(MediaError::invalid_filter_graph(format!(
                        "label [{}] is consumed before it is produced",
                        label
                    )));
                }
                if !consumed.insert(label.as_str()) {
                    return Err(MediaError::invalid_filter_graph(format!(
                        "label [{}] is consumed twice",
                        label
                    )));
                }
            }

            if chain.outputs.is_empty() {
                return Err(MediaError::invalid_filter_graph(format!(
                    "chain {} has no output label",
                    idx
                )));
            }
            for label in &chain.outputs {
                if !is_valid_label(label) {
                    return Err(MediaError::invalid_filter_graph(format!("invalid label [{}]", label)));
                }
                if !produced.insert(label.as_str()) {
                    return Err(MediaError::invalid_filter_graph(format!(
                        "label [{}] is produced twice",
                        label
                    )));
                }
            }
        }

        Ok(())
    }

    /// Labels produced but never consumed; these are the graph's outputs.
    pub fn sinks(&self) -> Vec<&str> {
        let consumed: HashSet<&str> = self
            .chains
            .iter()
            .flat_map(|c| c.inputs.iter().map(String::as_str))
            .collect();
        self.chains
            .iter()
            .flat_map(|c| c.outputs.iter().map(String::as_str))
            .filter(|l| !consumed.contains(l))
            .collect()
    }

    /// Validate and render to FFmpeg syntax.
    pub fn to_ffmpeg(&self) -> MediaResult<String> {
        self.validate()?;
        Ok(self
            .chains
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(input: &str, output: &str) -> FilterChain {
        FilterChain::new()
            .input(input)
            .filter(Filter::Trim { duration: 5.0 })
            .filter(Filter::ResetPts)
            .filter(Filter::Scale {
                width: 1280,
                height: 720,
                mode: ScaleMode::Fit,
            })
            .filter(Filter::Pad {
                width: 1280,
                height: 720,
            })
            .output(output)
    }

    #[test]
    fn test_render_xfade_graph() {
        let mut graph = FilterGraph::new();
        graph.push(normalize("0:v", "v0"));
        graph.push(normalize("1:v", "v1"));
        graph.push(
            FilterChain::new()
                .input("v0")
                .input("v1")
                .filter(Filter::XFade {
                    transition: "fade".into(),
                    duration: 0.75,
                    offset: 4.25,
                })
                .output("vout"),
        );

        let rendered = graph.to_ffmpeg().unwrap();
        assert!(rendered.starts_with(
            "[0:v]trim=duration=5.000,setpts=PTS-STARTPTS,scale=1280:720:force_original_aspect_ratio=decrease"
        ));
        assert!(rendered.ends_with("[v0][v1]xfade=transition=fade:duration=0.750:offset=4.250[vout]"));
        assert_eq!(rendered.matches(';').count(), 2);
        assert_eq!(graph.sinks(), vec!["vout"]);
    }

    #[test]
    fn test_rejects_unproduced_label() {
        let mut graph = FilterGraph::new();
        graph.push(
            FilterChain::new()
                .input("missing")
                .filter(Filter::SetSar)
                .output("out"),
        );
        assert!(matches!(graph.validate(), Err(MediaError::InvalidFilterGraph(_))));
    }

    #[test]
    fn test_rejects_double_consumption() {
        let mut graph = FilterGraph::new();
        graph.push(normalize("0:v", "v0"));
        graph.push(FilterChain::new().input("v0").filter(Filter::SetSar).output("a"));
        graph.push(FilterChain::new().input("v0").filter(Filter::SetSar).output("b"));
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_rejects_pad_count_mismatch() {
        let mut graph = FilterGraph::new();
        graph.push(
            FilterChain::new()
                .input("0:a")
                .filter(Filter::AMix {
                    inputs: 2,
                    duration: MixDuration::Longest,
                })
                .output("aout"),
        );
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_offset() {
        let filter = Filter::XFade {
            transition: "fade".into(),
            duration: 0.5,
            offset: -0.1,
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_audio_filters_render() {
        assert_eq!(Filter::ADelay { millis: 1500 }.to_string(), "adelay=delays=1500:all=1");
        assert_eq!(Filter::Volume(0.4).to_string(), "volume=0.400");
        assert_eq!(
            Filter::AMix {
                inputs: 3,
                duration: MixDuration::Longest
            }
            .to_string(),
            "amix=inputs=3:duration=longest:dropout_transition=0:normalize=0"
        );
    }

    #[test]
    fn test_simple_chain() {
        let chain = FilterChain::new()
            .filter(Filter::Fps(30))
            .filter(Filter::Format("yuv420p".into()));
        assert_eq!(chain.to_simple().unwrap(), "fps=30,format=yuv420p");
        assert!(FilterChain::new().to_simple().is_err());
    }
}
