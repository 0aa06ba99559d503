//! Drawing IV charts with the [Matplotlib][] Python library.
//!
//! Only the small part of Matplotlib's explicit interface needed to
//! draw line charts into files is bound.  Figures are created through
//! `pyplot` with the non-interactive "Agg" backend so that no display
//! is required.
//!
//! [Matplotlib]: https://matplotlib.org/

use std::path::{Path, PathBuf};
use lazy_static::lazy_static;
use ndarray::{ArrayBase, Ix1};
use numpy::PyArray1;
use pyo3::{
    prelude::*,
    intern,
    exceptions::{PyFileNotFoundError, PyPermissionError},
    types::PyDict,
};
use tracing::info;
use crate::{
    chart::{Chart, Y_LIMITS},
    report::Render,
};

macro_rules! getattr {
    ($py: ident, $lib: expr, $f: literal) => {
        $lib.getattr($py, intern!($py, $f))
    };
}

/// Build a dictionary of keyword arguments.
macro_rules! kwargs {
    ($py: ident, $($k: literal => $v: expr),* $(,)?) => {{
        let kwargs = PyDict::new($py);
        $( kwargs.set_item($k, $v)?; )*
        kwargs
    }};
}

macro_rules! meth {
    ($obj: expr, $m: ident, $py: ident -> $args: expr, $kwargs: expr) => {
        Python::with_gil(|$py| -> Result<(), Error> {
            let kwargs = $kwargs;
            $obj.call_method($py, intern!($py, stringify!($m)), $args,
                             Some(kwargs))?;
            Ok(())
        })
    };
    ($obj: expr, $m: ident, $args: expr) => {
        Python::with_gil(|py| -> Result<(), Error> {
            $obj.call_method1(py, intern!(py, stringify!($m)), $args)?;
            Ok(())
        })
    };
}

/// Possible errors of the plotting functions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Python library "matplotlib" was not found.
    #[error("The matplotlib library has not been found.\n\
             Please install it.  See https://matplotlib.org/")]
    NoMatplotlib,
    /// The path contains an element that is not a directory or does
    /// not exist.
    #[error("A path contains an element that is not a directory or \
             does not exist")]
    FileNotFoundError,
    /// Permission denied to access or create the filesystem path.
    #[error("Permission denied to access or create the filesystem path")]
    PermissionError,
    /// Other Python errors.
    #[error("Python error: {0}")]
    Python(#[from] PyErr),
}

lazy_static! {
    static ref PYPLOT: Result<Py<PyModule>, PyErr> = {
        Python::with_gil(|py| {
            PyModule::import(py, "matplotlib")?
                .call_method1("use", ("Agg",))?;
            PyModule::import(py, "matplotlib.pyplot").map(|m| m.into())
        })
    };
}

/// Return a handle to the module `$m`.
/// ⚠ This may try to lock Python's GIL.  Make sure it is executed
/// outside a call to `Python::with_gil`.
macro_rules! pymod { ($m: ident) => {
    $m.as_ref().map_err(|_| Error::NoMatplotlib)
}}

/// Data that can be converted to a numpy array.
pub trait Data {
    fn to_numpy(&self, py: Python) -> PyObject;
}

impl<S> Data for ArrayBase<S, Ix1>
where S: ndarray::Data<Elem = f64> {
    fn to_numpy(&self, py: Python) -> PyObject {
        let array: &PyAny = PyArray1::from_array(py, self);
        array.into_py(py)
    }
}

/// The top level container for all the plot elements.
#[derive(Debug)]
pub struct Figure {
    fig: PyObject, // instance of matplotlib.figure.Figure
}

#[derive(Debug, Clone)]
pub struct Axes {
    ax: PyObject,
}

/// Return a new figure of `width` × `height` inches whose elements
/// are placed with the "constrained" layout engine.
pub fn figure(width: f64, height: f64) -> Result<Figure, Error> {
    let pyplot = pymod!(PYPLOT)?;
    Python::with_gil(|py| {
        let kwargs = kwargs!(py, "figsize" => (width, height),
                             "layout" => "constrained");
        let fig = getattr!(py, pyplot, "figure")?
            .call(py, (), Some(kwargs))?;
        Ok(Figure { fig })
    })
}

impl Figure {
    /// Add a single axes filling the figure.
    pub fn axes(&self) -> Result<Axes, Error> {
        Python::with_gil(|py| {
            let ax = self.fig.call_method0(py, intern!(py, "add_subplot"))?;
            Ok(Axes { ax })
        })
    }

    pub fn save(&self) -> Savefig {
        Python::with_gil(|py| {
            Savefig { fig: self.fig.clone_ref(py) }
        })
    }

    /// Release the figure from pyplot's registry.
    pub fn close(self) -> Result<(), Error> {
        let pyplot = pymod!(PYPLOT)?;
        Python::with_gil(|py| {
            getattr!(py, pyplot, "close")?.call1(py, (self.fig,))?;
            Ok(())
        })
    }
}

/// Saving a figure; the format follows the file extension.
pub struct Savefig {
    fig: PyObject,
}

impl Savefig {
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        Python::with_gil(|py| {
            self.fig.call_method1(
                py, intern!(py, "savefig"), (path.as_ref(),)
            ).map_err(|e| {
                    if e.is_instance_of::<PyFileNotFoundError>(py) {
                        Error::FileNotFoundError
                    } else if e.is_instance_of::<PyPermissionError>(py) {
                        Error::PermissionError
                    } else {
                        Error::Python(e)
                    }
                })
        })?;
        Ok(())
    }
}

/// Tick settings of one kind ("major" or "minor") on both axes.
#[derive(Debug, Clone, Copy)]
pub struct Ticks {
    pub which: &'static str,
    pub labelsize: f64,
    pub length: f64,
    pub width: f64,
}

impl Axes {
    /// Plot `y` versus `x` as a line.
    #[must_use]
    pub fn xy<'a, D>(&'a mut self, x: &'a D, y: &'a D) -> Line<'a, D>
    where D: Data + ?Sized {
        Line { axes: self, x, y, label: "", linestyle: "-" }
    }

    pub fn set_title(&mut self, v: &str, fontsize: f64) -> Result<&mut Self, Error> {
        meth!(self.ax, set_title, py -> (v,),
              kwargs!(py, "fontsize" => fontsize))?;
        Ok(self)
    }

    /// Set the yaxis' scale.  Possible values for `v` are "linear",
    /// "log", "symlog", "logit",...
    pub fn set_yscale(&mut self, v: &str) -> Result<&mut Self, Error> {
        meth!(self.ax, set_yscale, (v,))?;
        Ok(self)
    }

    pub fn set_ylim(&mut self, bottom: f64, top: f64) -> Result<&mut Self, Error> {
        meth!(self.ax, set_ylim, (bottom, top))?;
        Ok(self)
    }

    pub fn grid(&mut self) -> Result<&mut Self, Error> {
        meth!(self.ax, grid, (true,))?;
        Ok(self)
    }

    pub fn set_xlabel(&mut self, label: &str, fontsize: f64) -> Result<&mut Self, Error> {
        meth!(self.ax, set_xlabel, py -> (label,),
              kwargs!(py, "fontsize" => fontsize))?;
        Ok(self)
    }

    pub fn set_ylabel(&mut self, label: &str, fontsize: f64) -> Result<&mut Self, Error> {
        meth!(self.ax, set_ylabel, py -> (label,),
              kwargs!(py, "fontsize" => fontsize))?;
        Ok(self)
    }

    /// Place the legend outside of the axes, on the lower right.
    pub fn legend_outside(&mut self, title: Option<&str>) -> Result<&mut Self, Error> {
        meth!(self.ax, legend, py -> (), {
            let kwargs = kwargs!(py,
                "bbox_to_anchor" => (1.01, 0., 0.25, 0.5),
                "loc" => "lower left",
                "borderaxespad" => 0.);
            if let Some(title) = title {
                kwargs.set_item("title", title)?;
            }
            kwargs
        })?;
        Ok(self)
    }

    /// Inward ticks on both axes, mirrored on the right side.
    pub fn tick_params(&mut self, t: Ticks) -> Result<&mut Self, Error> {
        meth!(self.ax, tick_params, py -> (),
              kwargs!(py, "axis" => "both", "which" => t.which,
                      "direction" => "in", "labelsize" => t.labelsize,
                      "length" => t.length, "width" => t.width,
                      "right" => true))?;
        Ok(self)
    }
}

#[must_use]
pub struct Line<'a, D>
where D: ?Sized {
    axes: &'a Axes,
    x: &'a D,
    y: &'a D,
    label: &'a str,
    linestyle: &'a str,
}

impl<'a, D> Line<'a, D>
where D: Data + ?Sized {
    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    /// Matplotlib line style, e.g. "-" or ":".
    pub fn linestyle(mut self, linestyle: &'a str) -> Self {
        self.linestyle = linestyle;
        self
    }

    pub fn plot(self) -> Result<(), Error> {
        Python::with_gil(|py| {
            let kwargs = kwargs!(py, "linestyle" => self.linestyle);
            if !self.label.is_empty() {
                kwargs.set_item("label", self.label)?
            }
            let xn = self.x.to_numpy(py);
            let yn = self.y.to_numpy(py);
            self.axes.ax.call_method(py, intern!(py, "plot"), (xn, yn),
                                     Some(kwargs))?;
            Ok(())
        })
    }
}

/// Renders [`Chart`]s to PNG and PDF files with Matplotlib.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matplotlib;

impl Matplotlib {
    /// Figure size in inches.
    pub const FIGSIZE: (f64, f64) = (8.5, 5.);
    pub const MAJOR: Ticks = Ticks {
        which: "major", labelsize: 18., length: 7., width: 1.5 };
    pub const MINOR: Ticks = Ticks {
        which: "minor", labelsize: 0., length: 5., width: 1. };

    fn draw(fig: &Figure, chart: &Chart) -> Result<(), Error> {
        let mut ax = fig.axes()?;
        ax.grid()?;
        for s in &chart.series {
            ax.xy(&s.x, &s.y).label(&s.label)
                .linestyle(s.style.as_str()).plot()?;
        }
        ax.set_title(&chart.title(), 20.)?
            .set_xlabel("Voltage [V]", 18.)?
            .set_ylabel("Current [$\\mu$A]", 18.)?
            .set_yscale("log")?
            .set_ylim(Y_LIMITS.0, Y_LIMITS.1)?;
        if chart.legend {
            ax.legend_outside(chart.legend_title.as_deref())?;
        }
        ax.tick_params(Self::MINOR)?.tick_params(Self::MAJOR)?;
        Ok(())
    }
}

impl Render for Matplotlib {
    fn render(
        &mut self, chart: &Chart, out_dir: &Path
    ) -> Result<Vec<PathBuf>, crate::Error> {
        let fig = figure(Self::FIGSIZE.0, Self::FIGSIZE.1)?;
        let paths = chart.output_paths(out_dir);
        let drawn = Self::draw(&fig, chart).and_then(|()| {
            paths.iter().try_for_each(|p| fig.save().to_file(p))
        });
        // Close on every path so figures do not pile up in pyplot.
        fig.close()?;
        drawn?;
        for p in &paths {
            info!("IV plot written to {}", p.display());
        }
        Ok(paths.to_vec())
    }
}
