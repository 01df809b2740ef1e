//! ffmpeg filtergraph snippets for fitting clips and drawing text layers.

use std::path::Path;

use crate::compose::layer::{BACKGROUND_PADDING, OverlayLayer};
use crate::compose::motion::{
    BOUNCE_AMPLITUDE, BOUNCE_BASELINE, BOUNCE_PERIOD, FLOAT_AMPLITUDE, FLOAT_BASELINE,
    FLOAT_PERIOD, Motion, SLIDE_LEAD_IN, StaticAnchor,
};
use crate::foundation::core::{FrameSize, fmt_secs};
use crate::model::overlay::{Alignment, HorizontalAnchor, VerticalAnchor};

/// Characters that end an option value inside a filter's argument string.
const OPTION_SPECIAL: &[char] = &[':'];
/// Characters that end a filter's argument string inside a filtergraph.
const GRAPH_SPECIAL: &[char] = &['[', ']', ',', ';'];

fn backslash_escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || c == '\'' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a value embedded in a filter option (`key=value`) of a filtergraph.
///
/// ffmpeg unescapes twice: once when splitting the graph into filters and once when splitting
/// a filter's arguments into options, so the value is escaped for the option level first and
/// the result again for the graph level.
pub fn escape_filter_value(raw: &str) -> String {
    backslash_escape(&backslash_escape(raw, OPTION_SPECIAL), GRAPH_SPECIAL)
}

/// Scale into `size` keeping the aspect ratio, then pad (letterbox) to exactly `size`.
pub fn fit_filter(size: FrameSize) -> String {
    let FrameSize { width, height } = size;
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,\
         pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1"
    )
}

/// The `-filter:v` chain for one composed clip.
pub fn video_chain(canonical: FrameSize, fps: u32, drawtexts: &[String]) -> String {
    let mut chain = vec![
        fit_filter(canonical),
        format!("fps={fps}"),
        "format=yuv420p".to_owned(),
    ];
    chain.extend(drawtexts.iter().cloned());
    chain.join(",")
}

fn num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-" | "-0" => "0".to_owned(),
        other => other.to_owned(),
    }
}

/// drawtext `x`/`y` expressions equivalent to [`Motion::position_at`] for a layer starting at
/// `start` seconds into the clip.
pub fn position_exprs(motion: &Motion, start: f64) -> (String, String) {
    let elapsed = format!("(t-{})", fmt_secs(start));
    let centered_x = "(w-text_w)/2".to_owned();
    let centered_y = "(h-text_h)/2".to_owned();

    match *motion {
        Motion::Static(StaticAnchor::Fraction { x, y, alignment }) => {
            let px = format!("{}*w", num(x));
            let x = match alignment {
                Alignment::Left => px,
                Alignment::Center => format!("{px}-text_w/2"),
                Alignment::Right => format!("{px}-text_w"),
            };
            (x, format!("{}*h-text_h/2", num(y)))
        }
        Motion::Static(StaticAnchor::Pixels { x, y }) => (num(x), num(y)),
        Motion::Static(StaticAnchor::Keyword {
            horizontal,
            vertical,
        }) => {
            let x = match horizontal {
                HorizontalAnchor::Left => "0".to_owned(),
                HorizontalAnchor::Center => centered_x,
                HorizontalAnchor::Right => "w-text_w".to_owned(),
            };
            let y = match vertical {
                VerticalAnchor::Top => "0".to_owned(),
                VerticalAnchor::Center => centered_y,
                VerticalAnchor::Bottom => "h-text_h".to_owned(),
            };
            (x, y)
        }
        Motion::Bounce => (
            centered_x,
            format!(
                "{}+{}*abs(2*mod({elapsed},{})-1)",
                num(BOUNCE_BASELINE),
                num(BOUNCE_AMPLITUDE),
                num(BOUNCE_PERIOD)
            ),
        ),
        Motion::Slide { duration } => {
            let x = if duration > 0.0 {
                format!("{elapsed}/{}*w-{}", num(duration), num(SLIDE_LEAD_IN))
            } else {
                num(-SLIDE_LEAD_IN)
            };
            (x, centered_y)
        }
        Motion::Float => (
            centered_x,
            format!(
                "{}+{}*sin(2*PI*{elapsed}/{})",
                num(FLOAT_BASELINE),
                num(FLOAT_AMPLITUDE),
                num(FLOAT_PERIOD)
            ),
        ),
    }
}

/// Turn a face name such as `Arial-Bold` into a fontconfig pattern (`Arial:style=Bold`).
pub fn fontconfig_pattern(font: &str) -> String {
    match font.trim().rsplit_once('-') {
        Some((family, style)) if !family.is_empty() && !style.is_empty() => {
            format!("{family}:style={style}")
        }
        _ => font.trim().to_owned(),
    }
}

/// A drawtext filter for `layer`, reading its text from `textfile`.
pub fn drawtext(layer: &OverlayLayer, textfile: &Path) -> String {
    let (x, y) = position_exprs(&layer.motion, layer.start);
    let enable = format!(
        "between(t,{},{})",
        fmt_secs(layer.start),
        fmt_secs(layer.end())
    );

    let mut opts = vec![
        format!(
            "textfile={}",
            escape_filter_value(&textfile.to_string_lossy())
        ),
        "expansion=none".to_owned(),
        format!("font={}", escape_filter_value(&fontconfig_pattern(&layer.font))),
        format!("fontsize={}", layer.font_size),
        format!(
            "fontcolor=0x{}@{}",
            layer.color.to_hex(),
            num(layer.opacity)
        ),
        format!("x={}", escape_filter_value(&x)),
        format!("y={}", escape_filter_value(&y)),
        format!("enable={}", escape_filter_value(&enable)),
    ];
    if let Some(bg) = layer.background {
        opts.push("box=1".to_owned());
        opts.push(format!(
            "boxcolor=0x{}@{}",
            bg.color.to_hex(),
            num(bg.opacity)
        ));
        opts.push(format!("boxborderw={}", num(BACKGROUND_PADDING)));
    }

    format!("drawtext={}", opts.join(":"))
}
