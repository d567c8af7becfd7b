//! Text output shared by the subcommands and the session

use std::io::{self, Write};

use voxlab_audio::{EffectId, EffectParams, EffectRegistry, LevelReading, ParamSpec};

/// Width of the input level bar in characters
const METER_WIDTH: usize = 30;

/// Lowest level shown on the meter
const METER_FLOOR_DB: f32 = -60.0;

/// Values are shown with as many decimals as their step needs
fn format_value(spec: &ParamSpec, value: f32) -> String {
    let step = spec.range.step;
    if step >= 1.0 {
        format!("{value:.0}")
    } else if (step * 10.0).fract().abs() < 1e-4 {
        format!("{value:.1}")
    } else {
        format!("{value:.2}")
    }
}

fn write_param_line(out: &mut impl Write, spec: &ParamSpec, value: f32) -> io::Result<()> {
    writeln!(
        out,
        "    {:<15} {:>7}   {} [{} .. {}, step {}]",
        spec.key,
        format_value(spec, value),
        spec.label,
        format_value(spec, spec.range.min),
        format_value(spec, spec.range.max),
        format_value(spec, spec.range.step),
    )
}

/// All effects in registry order, marking the selected one
pub fn write_effect_list(out: &mut impl Write, selected: Option<EffectId>) -> io::Result<()> {
    for definition in EffectRegistry::global().list() {
        let marker = if Some(definition.id) == selected { '*' } else { ' ' };
        writeln!(
            out,
            "{marker} {} {:<12} ({})",
            definition.emoji,
            definition.name,
            definition.id.as_str()
        )?;
        for (spec, (_, value)) in definition.params.iter().zip(definition.defaults.values()) {
            write_param_line(out, spec, value)?;
        }
    }
    Ok(())
}

/// Educational text and parameter table for one effect
pub fn write_info(out: &mut impl Write, id: EffectId) -> io::Result<()> {
    let definition = EffectRegistry::global().definition(id);
    let content = definition.educational;

    writeln!(out, "{} {}", definition.emoji, content.name)?;
    writeln!(out)?;
    writeln!(out, "{}", content.explanation)?;
    writeln!(out)?;
    writeln!(out, "STEM connection: {}", content.stem_connection)?;
    if let Some(fact) = content.did_you_know {
        writeln!(out)?;
        writeln!(out, "Did you know? {fact}")?;
    }
    writeln!(out)?;
    writeln!(out, "Parameters (defaults):")?;
    write_params(out, &definition.defaults)
}

/// Current parameter values with their ranges
pub fn write_params(out: &mut impl Write, params: &EffectParams) -> io::Result<()> {
    for (spec, (_, value)) in params.specs().iter().zip(params.values()) {
        write_param_line(out, spec, value)?;
    }
    Ok(())
}

/// One-line input meter: bar, RMS level in dB and elapsed time
pub fn level_bar(reading: LevelReading, elapsed_secs: f64) -> String {
    let db = reading.rms_db().max(METER_FLOOR_DB);
    let fill = ((db - METER_FLOOR_DB) / -METER_FLOOR_DB * METER_WIDTH as f32).round() as usize;
    let fill = fill.min(METER_WIDTH);
    let clip = if reading.peak >= 0.99 { '!' } else { ' ' };
    format!(
        "[{}{}]{clip} {:>6.1} dB  {:>4.1}s",
        "#".repeat(fill),
        " ".repeat(METER_WIDTH - fill),
        reading.rms_db(),
        elapsed_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_list_marks_selection() {
        let text = render(|out| write_effect_list(out, Some(EffectId::Echo)));
        assert!(text.contains("* 🏔️ Echo"));
        assert!(text.contains("delayTime"));
        assert!(text.contains("voices"));
        assert_eq!(text.lines().filter(|l| l.starts_with("* ")).count(), 1);
    }

    #[test]
    fn test_info_has_education_and_params() {
        let text = render(|out| write_info(out, EffectId::Robot));
        assert!(text.contains("STEM connection:"));
        assert!(text.contains("modulationFreq"));
        assert!(text.contains("filterQ"));
    }

    #[test]
    fn test_value_precision_follows_step() {
        let params = EffectParams::defaults(EffectId::Echo);
        let text = render(|out| write_params(out, &params));
        assert!(text.contains("0.25"));
        assert!(text.contains("0.70"));
    }

    #[test]
    fn test_level_bar_bounds() {
        let silent = level_bar(LevelReading { peak: 0.0, rms: 0.0 }, 0.0);
        assert!(silent.starts_with(&format!("[{}]", " ".repeat(METER_WIDTH))));

        let loud = level_bar(LevelReading { peak: 1.0, rms: 1.0 }, 1.5);
        assert!(loud.starts_with(&format!("[{}]!", "#".repeat(METER_WIDTH))));
        assert!(loud.ends_with("1.5s"));
    }
}
