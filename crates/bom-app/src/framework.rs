//! The framework facade: configuration + settings + skeleton -> bill of materials.

use std::path::Path;

use bom_core::NodeId;
use bom_graph::Bom;
use bom_skeleton::{Catalog, ParameterSets, Settings, Skeleton, SkeletonMutator, TopRef};
use tracing::{error, info};

use crate::config::Configuration;
use crate::error::{AppError, AppResult};

/// Entry point for building skeletons and graphs from an injected configuration.
#[derive(Clone, Debug, Default)]
pub struct Framework {
    config: Configuration,
}

impl Framework {
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    /// Framework over the configuration file at `path`.
    pub fn from_config_path(path: &Path) -> AppResult<Self> {
        Ok(Self::new(Configuration::load(path)?))
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    /// Build the skeleton of the configured top part from the configured catalogs.
    pub fn build_skeleton(&self) -> AppResult<Skeleton> {
        let top = self.config.top()?;
        let kind = top
            .kind
            .as_deref()
            .ok_or_else(|| AppError::ConfigurationIncomplete {
                what: format!("top '{}' needs a type to build a skeleton", top.reference),
            })?;
        let catalog = Catalog::load(self.config.parts()?)?;
        let parameters = ParameterSets::load(self.config.parameters()?)?;
        let skeleton = bom_skeleton::build_skeleton(
            &top.reference,
            kind,
            &catalog,
            &parameters,
            &self.config.build_options(),
        )?;
        info!(top = %top.reference, records = skeleton.len(), "built skeleton from configuration");
        Ok(skeleton)
    }

    /// Apply `settings` to `skeleton` in place, drawing on the configured catalogs
    /// and material selector.
    pub fn mutate(&self, skeleton: &mut Skeleton, settings: Settings) -> AppResult<()> {
        let view = self.config.config_view();
        let mut mutator = SkeletonMutator::new(settings, &view, Some(self.config.materials()))?;
        mutator.apply(skeleton)?;
        Ok(())
    }

    /// Mutate `skeleton` with `settings` and build the graph below the top part.
    ///
    /// `top` overrides the reference given by the settings, which in turn
    /// overrides the configuration.
    pub fn reader(
        &self,
        mut skeleton: Skeleton,
        top: Option<&str>,
        mut settings: Settings,
    ) -> AppResult<(Bom, NodeId)> {
        if let Some(top) = top {
            match &mut settings.top {
                Some(current) => current.reference = top.to_string(),
                None => {
                    settings.top = Some(TopRef {
                        reference: top.to_string(),
                        kind: None,
                    });
                }
            }
        }
        let settings = settings.checked(&self.config.config_view());
        let Some(root) = settings.top.as_ref().map(|t| t.reference.clone()) else {
            let what = "top level must be supplied directly or in settings/config".to_string();
            error!("{what}");
            return Err(AppError::ConfigurationIncomplete { what });
        };

        self.mutate(&mut skeleton, settings)?;
        self.load(&root, &skeleton)
    }

    /// Build the graph below `top` straight from a skeleton, without settings.
    pub fn load(&self, top: &str, skeleton: &Skeleton) -> AppResult<(Bom, NodeId)> {
        let mut bom = Bom::new(self.config.graph_options());
        let root = bom.from_skeleton(skeleton, top)?;
        info!(top, nodes = bom.len(), "loaded bill of materials");
        Ok((bom, root))
    }

    /// Configuration skeleton, optionally mutated by `settings`, and its graph.
    ///
    /// The graph is rooted at the settings' top when they name one, since a
    /// spine rebuild expands that reference rather than the configured one.
    pub fn build(&self, settings: Option<Settings>) -> AppResult<(Skeleton, Bom, NodeId)> {
        let mut skeleton = self.build_skeleton()?;
        let top = match settings.as_ref().and_then(|s| s.top.as_ref()) {
            Some(top) => top.reference.clone(),
            None => self.config.top()?.reference.clone(),
        };
        if let Some(settings) = settings {
            self.mutate(&mut skeleton, settings)?;
        }
        let (bom, root) = self.load(&top, &skeleton)?;
        Ok((skeleton, bom, root))
    }
}
