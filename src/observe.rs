//! Shape observers for a single forward pass.
//!
//! A model reports each sub-module call to an [`ObserverScope`], which
//! forwards it to a [`ForwardObserver`] only when that sub-module is attached.
//! Attachment lives exactly as long as the scope value.

use std::fmt;

/// Receives one call per invocation of an attached sub-module.
pub trait ForwardObserver {
    fn on_invoke(&mut self, name: &str, input_shapes: &[&[usize]], output_shape: &[usize]);
}

/// Stable, ordered names of a model's sub-modules, root first.
pub trait NamedModules {
    fn named_modules(&self) -> Vec<&'static str>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub input_shapes: Vec<Vec<usize>>,
    pub output_shape: Vec<usize>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] in:{:?} out:{:?}",
            self.name, self.input_shapes, self.output_shape
        )
    }
}

impl Invocation {
    fn new(name: &str, input_shapes: &[&[usize]], output_shape: &[usize]) -> Self {
        Self {
            name: name.to_string(),
            input_shapes: input_shapes.iter().map(|shape| shape.to_vec()).collect(),
            output_shape: output_shape.to_vec(),
        }
    }
}

/// Prints every invocation to stdout as soon as it happens.
#[derive(Debug, Default)]
pub struct ShapePrinter;

impl ForwardObserver for ShapePrinter {
    fn on_invoke(&mut self, name: &str, input_shapes: &[&[usize]], output_shape: &[usize]) {
        println!("{}", Invocation::new(name, input_shapes, output_shape));
    }
}

/// Keeps every invocation in call order.
#[derive(Debug, Default)]
pub struct ShapeRecorder {
    invocations: Vec<Invocation>,
}

impl ShapeRecorder {
    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    pub fn names(&self) -> Vec<&str> {
        self.invocations.iter().map(|inv| inv.name.as_str()).collect()
    }
}

impl ForwardObserver for ShapeRecorder {
    fn on_invoke(&mut self, name: &str, input_shapes: &[&[usize]], output_shape: &[usize]) {
        self.invocations
            .push(Invocation::new(name, input_shapes, output_shape));
    }
}

/// Observer attachment for one forward pass. Dropping the scope detaches
/// everything, whether the pass returned or unwound.
pub struct ObserverScope<'a> {
    attached: Vec<&'static str>,
    observer: Option<&'a mut dyn ForwardObserver>,
}

impl<'a> ObserverScope<'a> {
    pub fn detached() -> Self {
        Self {
            attached: Vec::new(),
            observer: None,
        }
    }

    /// Attaches `observer` to the first `first` entries of
    /// `model.named_modules()`.
    pub fn attach<M: NamedModules + ?Sized>(
        model: &M,
        first: usize,
        observer: &'a mut dyn ForwardObserver,
    ) -> Self {
        if first == 0 {
            return Self::detached();
        }

        let attached: Vec<&'static str> = model.named_modules().into_iter().take(first).collect();
        tracing::debug!("Attached observer to {:?}", attached);

        Self {
            attached,
            observer: Some(observer),
        }
    }

    pub fn attached(&self) -> &[&'static str] {
        &self.attached
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.attached.iter().any(|attached| *attached == name)
    }

    pub fn record(&mut self, name: &str, input_shapes: &[&[usize]], output_shape: &[usize]) {
        if !self.is_attached(name) {
            return;
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.on_invoke(name, input_shapes, output_shape);
        }
    }
}

impl Drop for ObserverScope<'_> {
    fn drop(&mut self) {
        if !self.attached.is_empty() {
            tracing::debug!("Detached observer from {} modules", self.attached.len());
        }
        self.attached.clear();
        self.observer = None;
    }
}
