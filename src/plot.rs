// SPDX: CC0-1.0

use crate::{
    field::{FieldSample, Window},
    Number,
};
use anyhow::Context;
use chrono::{DateTime, Local};
use log::{debug, info};
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    process::{self, Child},
};

const OUTPUT_RES: [u32; 2] = [1920, 1080];

// arrows stop just short of their grid neighbors
const DAMP: Number = 0.9;

/// Cosmetic only. Toggling the style changes the colors handed to gnuplot
/// and nothing else; sampling output is identical either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Light,
    Dark,
}

impl Style {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    const fn palette(&self) -> Palette {
        match self {
            Self::Light => Palette {
                background: "#ffffff",
                arrow: "#1e90ff", // dodgerblue
                axis: "#9a9a9a",
                text: "#1a1a1a",
            },
            Self::Dark => Palette {
                background: "#14161a",
                arrow: "#4fa8ff",
                axis: "#55595f",
                text: "#d8dce1",
            },
        }
    }
}

struct Palette {
    background: &'static str,
    arrow: &'static str,
    axis: &'static str,
    text: &'static str,
}

fn artifact_name(now: DateTime<Local>, ext: &str) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        ext
    )
}

/// Write the sampled field and a matching gnuplot script to timestamped
/// files, then hand them to a `gnuplot --persist` child.
///
/// Undefined arrows never reach the data file, so gnuplot has nothing to
/// misrender at poles or outside function domains.
pub fn render(
    field: &FieldSample,
    win: &Window,
    expr: &str,
    style: Style,
) -> anyhow::Result<Child> {
    let now = Local::now();
    let data_path = artifact_name(now, "data");
    let script_path = artifact_name(now, "gnuplot");
    let svg_path = artifact_name(now, "svg");

    let mut data = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&data_path)
            .context("failed to open output data file")?,
    );
    let mut drawn = 0usize;
    for (at, dir) in field.defined() {
        writeln!(data, "{} {} {} {}", at.x, at.y, dir.x, dir.y)
            .context("failed to write to output data file")?;
        drawn += 1;
    }
    data.flush()?;
    data.get_mut().sync_data()?;
    drop(data);
    debug!(
        "{drawn} of {total} arrows defined",
        total = field.arrows().len()
    );

    let mut script = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&script_path)
            .context("failed to open output gnuplot file")?,
    );
    let palette = style.palette();
    let [width, height] = OUTPUT_RES;
    let step = field.step();

    writeln!(script, "reset")?;
    writeln!(script, "set term push")?;
    writeln!(
        script,
        "set terminal svg size {width},{height} enhanced background '{bg}'",
        bg = palette.background
    )?;
    writeln!(script, "set output '{svg_path}'")?;

    writeln!(
        script,
        "set xrange[{min}:{max}]",
        min = win.x().start,
        max = win.x().end
    )?;
    writeln!(
        script,
        "set yrange[{min}:{max}]",
        min = win.y().start,
        max = win.y().end
    )?;

    writeln!(script, r#"set title "dy/dx = {expr}""#)?;
    writeln!(
        script,
        "set title noenhanced textcolor rgb '{text}'",
        text = palette.text
    )?;
    writeln!(script, "set border lc rgb '{axis}'", axis = palette.axis)?;
    writeln!(
        script,
        "set tics out nomirror textcolor rgb '{text}'",
        text = palette.text
    )?;
    // the dashed lines through the origin the plot is read against
    writeln!(script, "set xzeroaxis lt 0 lc rgb '{axis}'", axis = palette.axis)?;
    writeln!(script, "set yzeroaxis lt 0 lc rgb '{axis}'", axis = palette.axis)?;
    writeln!(
        script,
        r#"set xlabel "x" textcolor rgb '{text}'"#,
        text = palette.text
    )?;
    writeln!(
        script,
        r#"set ylabel "y" textcolor rgb '{text}'"#,
        text = palette.text
    )?;
    writeln!(
        script,
        "set key out vertical top right textcolor rgb '{text}'",
        text = palette.text
    )?;

    writeln!(
        script,
        "set style arrow 2 nohead lc rgb '{arrow}'",
        arrow = palette.arrow
    )?;

    // directions are unit length; scale each by the grid step so arrow
    // length is visually uniform and conveys direction only
    writeln!(script, r#"plot '{data_path}' \"#)?;
    writeln!(
        script,
        r#"  using 1:2:({DAMP}*{xstep}*$3):({DAMP}*{ystep}*$4) \"#,
        xstep = step.x,
        ystep = step.y,
    )?;
    writeln!(script, r#"  with vectors arrowstyle 2 \"#)?;
    writeln!(script, r#"  title "dy/dx = {expr}" noenhance"#)?;

    writeln!(script, "set term pop")?;
    writeln!(script, "replot")?;

    script.flush()?;
    script.get_mut().sync_data()?;
    drop(script);

    let mut cmd = process::Command::new("gnuplot");
    cmd.arg("--persist").arg(&script_path);
    #[cfg(not(debug_assertions))]
    {
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
    }
    let child = cmd
        .spawn()
        .context("failed to spawn gnuplot (is it installed and in ${PATH}?)")?;
    info!("plotted {drawn} arrows, svg at {svg_path}");

    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_toggle_round_trips() {
        assert_eq!(Style::Light.toggled(), Style::Dark);
        assert_eq!(Style::Dark.toggled().toggled(), Style::Dark);
    }

    #[test]
    fn artifact_names_carry_the_extension() {
        let now = Local::now();
        let name = artifact_name(now, "svg");
        assert!(name.starts_with(env!("CARGO_PKG_NAME")));
        assert!(name.ends_with(".svg"));
    }
}
