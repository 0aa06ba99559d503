//! What goes on an IV chart, independently of how it is drawn.

use std::path::{Path, PathBuf};
use ndarray::Array1;
use crate::measurement::{Band, BandCollection, IvMeasurement, ModuleCurves};

/// Limits of the current axis [µA].
pub const Y_LIMITS: (f64, f64) = (0.0004, 100.);

/// Extensions of the files written for every chart.
pub const FORMATS: [&str; 2] = ["png", "pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dotted,
}

impl LineStyle {
    /// Matplotlib's name of the style.
    pub fn as_str(self) -> &'static str {
        match self {
            LineStyle::Solid => "-",
            LineStyle::Dotted => ":",
        }
    }
}

impl From<Band> for LineStyle {
    fn from(band: Band) -> Self {
        match band {
            Band::Room => LineStyle::Solid,
            Band::Minus40 | Band::Plus20 => LineStyle::Dotted,
        }
    }
}

/// One IV curve: |V| [V] on x, I [µA] on y.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub style: LineStyle,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
}

impl Series {
    pub fn new(label: String, style: LineStyle, iv: &IvMeasurement) -> Self {
        Series { label, style, x: iv.voltage(), y: iv.current_ua() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Module name or summary name; also the stem of the output files.
    pub name: String,
    pub series: Vec<Series>,
    pub legend: bool,
    pub legend_title: Option<String>,
}

impl Chart {
    /// Chart of one module with a curve per band that has data, or
    /// `None` if no band has any.
    pub fn module(name: &str, curves: &ModuleCurves) -> Option<Chart> {
        let series: Vec<_> = Band::ALL.iter()
            .filter_map(|&band| {
                let iv = curves.get(band)?;
                let humidity = match iv.rel_hum {
                    Some(h) => format!("{h:?}"),
                    None => "None".to_string(),
                };
                let label = format!("temperature = {:?}, humidity = {humidity}",
                                    iv.temp_c);
                Some(Series::new(label, band.into(), iv))
            })
            .collect();
        if series.is_empty() {
            return None;
        }
        Some(Chart { name: name.to_string(), series,
                     legend: true, legend_title: None })
    }

    /// Chart overlaying the curves of all `modules` in `band`, or
    /// `None` if there are none.
    pub fn summary(band: Band, modules: Option<&BandCollection>)
                   -> Option<Chart> {
        let modules = modules.filter(|m| !m.is_empty())?;
        let series = modules.iter()
            .map(|(module, iv)| Series::new(module.to_string(), band.into(), iv))
            .collect();
        Some(Chart { name: band.summary_name().to_string(), series,
                     legend: true,
                     legend_title: Some(band.legend_title().to_string()) })
    }

    #[must_use]
    pub fn with_legend(mut self, legend: bool) -> Self {
        self.legend = legend;
        self
    }

    pub fn title(&self) -> String {
        format!("{} IV", self.name)
    }

    /// Files the chart is saved to in `dir`.
    pub fn output_paths(&self, dir: &Path) -> [PathBuf; 2] {
        FORMATS.map(|ext| dir.join(format!("{}_IV.{ext}", self.name)))
    }
}
