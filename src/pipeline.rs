//! Dispatch of named transformation chains.
//!
//! A [`Registry`] is an explicit table from name to factory. It is built by
//! the caller and handed to a [`Pipeline`]; there is no process-wide
//! registry, so independent pipelines (one per test, one per config) never
//! interfere.
//!
//! # Running a chain
//!
//! ```text
//! [Invocation]  --resolve-->  [Box<dyn Transformation>]  --apply in order-->  Image
//!   name + params     lookup (ConfigurationError)          TransformationError
//!                     validate (ValidationError)
//! ```
//!
//! Every invocation in the chain is resolved and validated before the first
//! one runs, so an unknown name or a missing parameter anywhere in the chain
//! is reported without a single backend call. Execution is strictly
//! sequential; the first failure aborts the rest of the chain and is returned
//! unchanged.

use crate::imaging::ImageBackend;
use crate::params::{Params, ValidationError};
use crate::transformations::{
    Canvas, Compress, Crop, FlipHorizontally, FlipVertically, Resize, Rotate, Transformation,
    TransformationError,
};
use crate::types::Image;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Unknown transformation: {0}")]
    UnknownTransformation(String),
}

/// Any failure of a chain, tagged by kind.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transformation(#[from] TransformationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Protocol-neutral classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    BadRequest,
    InternalServerError,
}

impl ErrorStatus {
    pub fn code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::InternalServerError => 500,
        }
    }
}

impl PipelineError {
    pub fn status(&self) -> ErrorStatus {
        match self {
            Self::Validation(_) | Self::Transformation(_) => ErrorStatus::BadRequest,
            Self::Configuration(_) => ErrorStatus::InternalServerError,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transformation(_) => "transformation",
            Self::Configuration(_) => "configuration",
        }
    }
}

/// Builds a configured transformation from raw parameters.
pub type Factory = fn(&Params) -> Result<Box<dyn Transformation>, ValidationError>;

/// Name → factory table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in transformation under its canonical name.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Canvas::NAME, |p| Ok(Box::new(Canvas::from_params(p)?)));
        registry.register(Rotate::NAME, |p| Ok(Box::new(Rotate::from_params(p)?)));
        registry.register(FlipHorizontally::NAME, |p| {
            Ok(Box::new(FlipHorizontally::from_params(p)?))
        });
        registry.register(FlipVertically::NAME, |p| {
            Ok(Box::new(FlipVertically::from_params(p)?))
        });
        registry.register(Compress::NAME, |p| Ok(Box::new(Compress::from_params(p)?)));
        registry.register(Crop::NAME, |p| Ok(Box::new(Crop::from_params(p)?)));
        registry.register(Resize::NAME, |p| Ok(Box::new(Resize::from_params(p)?)));
        registry
    }

    /// Add or replace a factory.
    pub fn register(&mut self, name: impl Into<String>, factory: Factory) -> &mut Self {
        self.factories.insert(name.into(), factory);
        self
    }

    /// Keep only the named entries. Unknown names are an error.
    pub fn restrict_to<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, ConfigurationError> {
        if let Some(unknown) = names.iter().find(|n| !self.contains(n.as_ref())) {
            return Err(ConfigurationError::UnknownTransformation(
                unknown.as_ref().to_string(),
            ));
        }
        self.factories
            .retain(|name, _| names.iter().any(|n| n.as_ref() == name));
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Look up `invocation.name` and validate its parameters.
    pub fn build(&self, invocation: &Invocation) -> Result<Box<dyn Transformation>, PipelineError> {
        let factory = self
            .factories
            .get(&invocation.name)
            .ok_or_else(|| ConfigurationError::UnknownTransformation(invocation.name.clone()))?;
        Ok(factory(&invocation.params)?)
    }
}

/// One requested step: a transformation name and its raw parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub params: Params,
}

impl Invocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
        }
    }

    pub fn with_params(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }
}

/// Dispatcher: a registry bound to a backend.
pub struct Pipeline<B> {
    registry: Registry,
    backend: B,
}

impl<B: ImageBackend> Pipeline<B> {
    pub fn new(registry: Registry, backend: B) -> Self {
        Self { registry, backend }
    }

    /// Pipeline over every built-in transformation.
    pub fn with_defaults(backend: B) -> Self {
        Self::new(Registry::with_defaults(), backend)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resolve and validate a whole chain without touching any image.
    pub fn prepare(
        &self,
        chain: &[Invocation],
    ) -> Result<Vec<Box<dyn Transformation>>, PipelineError> {
        chain.iter().map(|inv| self.registry.build(inv)).collect()
    }

    /// Apply `chain` to `image` in order.
    ///
    /// On success every step has run and the image is flagged transformed
    /// (unless the chain was empty). On failure the steps before the failing
    /// one have been applied and the failing one left the image untouched.
    pub fn apply_chain(&self, image: &mut Image, chain: &[Invocation]) -> Result<(), PipelineError> {
        let steps = self.prepare(chain).inspect_err(|e| {
            warn!(kind = e.kind(), error = %e, "chain rejected");
        })?;
        self.run(image, &steps)
    }

    /// Apply already prepared steps in order.
    pub fn run(
        &self,
        image: &mut Image,
        steps: &[Box<dyn Transformation>],
    ) -> Result<(), PipelineError> {
        for (index, step) in steps.iter().enumerate() {
            let before = image.dimensions();
            if let Err(e) = step.apply(image, &self.backend) {
                warn!(
                    step = index,
                    transformation = step.name(),
                    error = %e,
                    "transformation failed, aborting chain"
                );
                return Err(e.into());
            }
            image.mark_transformed();
            debug!(
                step = index,
                transformation = step.name(),
                from = ?(before.width, before.height),
                to = ?(image.width(), image.height()),
                "applied"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, OpKind};
    use crate::test_helpers::{assert_model_consistent, png_image};

    fn mock_pipeline() -> Pipeline<MockBackend> {
        Pipeline::with_defaults(MockBackend::new())
    }

    #[test]
    fn default_registry_lists_builtins() {
        let registry = Registry::with_defaults();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "canvas",
                "compress",
                "crop",
                "flip-horizontally",
                "flip-vertically",
                "resize",
                "rotate"
            ]
        );
    }

    #[test]
    fn registries_are_independent() {
        let mut custom = Registry::new();
        custom.register("mirror", |p| Ok(Box::new(FlipHorizontally::from_params(p)?)));
        assert!(custom.contains("mirror"));
        assert!(!Registry::with_defaults().contains("mirror"));
    }

    #[test]
    fn restrict_to_keeps_named_entries() {
        let registry = Registry::with_defaults()
            .restrict_to(&["canvas", "rotate"])
            .unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["canvas", "rotate"]);
    }

    #[test]
    fn restrict_to_rejects_unknown_names() {
        let err = Registry::with_defaults()
            .restrict_to(&["canvas", "sepia"])
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownTransformation("sepia".into()));
    }

    #[test]
    fn unknown_transformation_is_a_configuration_error() {
        let pipeline = mock_pipeline();
        let mut image = png_image(4, 4);
        let err = pipeline
            .apply_chain(&mut image, &[Invocation::new("sepia")])
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Configuration(ConfigurationError::UnknownTransformation(ref n)) if n == "sepia"
        ));
        assert_eq!(err.status(), ErrorStatus::InternalServerError);
        assert_eq!(err.status().code(), 500);
        assert_eq!(pipeline.backend().call_count(), 0);
    }

    #[test]
    fn missing_quality_fails_before_any_backend_call() {
        let pipeline = mock_pipeline();
        let mut image = png_image(4, 4);
        let err = pipeline
            .apply_chain(&mut image, &[Invocation::new("compress")])
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::Missing(ref n)) if n == "quality"
        ));
        assert_eq!(err.to_string(), "Missing required parameter: quality");
        assert_eq!(err.status(), ErrorStatus::BadRequest);
        assert_eq!(pipeline.backend().call_count(), 0);
        assert!(!image.is_transformed());
    }

    #[test]
    fn invalid_step_later_in_chain_stops_everything_up_front() {
        let pipeline = mock_pipeline();
        let mut image = png_image(4, 4);
        let before = image.clone();
        let chain = [
            Invocation::new("flip-horizontally"),
            Invocation::new("rotate"),
        ];
        let err = pipeline.apply_chain(&mut image, &chain).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(pipeline.backend().call_count(), 0);
        assert_eq!(image, before);
    }

    #[test]
    fn backend_failure_aborts_remaining_chain() {
        let pipeline = Pipeline::with_defaults(MockBackend::failing(OpKind::Rotate, "rotor jammed"));
        let mut image = png_image(6, 4);
        let chain = [
            Invocation::new("flip-horizontally"),
            Invocation::new("rotate").param("angle", "90"),
            Invocation::new("compress").param("quality", "50"),
        ];
        let err = pipeline.apply_chain(&mut image, &chain).unwrap_err();

        assert_eq!(err.kind(), "transformation");
        assert_eq!(err.status().code(), 400);
        assert!(err.to_string().contains("rotor jammed"));
        // flip ran, rotate failed, compress never started
        assert!(image.is_transformed());
        assert_eq!((image.width(), image.height()), (6, 4));
        assert!(!pipeline.backend().get_operations().iter().any(|op| matches!(
            op,
            crate::imaging::backend::tests::RecordedOp::Encode {
                quality: Some(_),
                ..
            }
        )));
    }

    #[test]
    fn chain_runs_in_order_and_marks_transformed() {
        let pipeline = mock_pipeline();
        let mut image = png_image(46, 66);
        let chain = [
            Invocation::new("rotate").param("angle", "90"),
            Invocation::new("canvas")
                .param("width", "100")
                .param("height", "40")
                .param("mode", "center"),
        ];
        pipeline.apply_chain(&mut image, &chain).unwrap();
        assert_eq!((image.width(), image.height()), (100, 40));
        assert!(image.is_transformed());
        assert_model_consistent(&image);
    }

    #[test]
    fn empty_chain_leaves_image_alone() {
        let pipeline = mock_pipeline();
        let mut image = png_image(3, 3);
        pipeline.apply_chain(&mut image, &[]).unwrap();
        assert!(!image.is_transformed());
        assert_eq!(pipeline.backend().call_count(), 0);
    }

    #[test]
    fn prepare_returns_steps_by_name() {
        let steps = mock_pipeline()
            .prepare(&[
                Invocation::new("flip-vertically"),
                Invocation::new("compress").param("quality", "10"),
            ])
            .unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["flip-vertically", "compress"]);
    }
}
