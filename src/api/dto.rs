//! Wire DTOs for the cluster API and their conversion into the domain model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::node::{LEGACY_TAINTS_ANNOTATION, TaintEffect};
use crate::domain::{Node, OwnerReference, Taint, Workload};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReferenceDto {
    pub kind: String,
    pub name: String,
}

impl From<&OwnerReference> for OwnerReferenceDto {
    fn from(r: &OwnerReference) -> Self {
        OwnerReferenceDto { kind: r.kind.clone(), name: r.name.clone() }
    }
}

impl From<OwnerReferenceDto> for OwnerReference {
    fn from(dto: OwnerReferenceDto) -> Self {
        OwnerReference { kind: dto.kind, name: dto.name }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadDto {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub owner_references: Vec<OwnerReferenceDto>,
    #[serde(default)]
    pub bound_node: Option<String>,
    #[serde(default)]
    pub termination_grace_seconds: Option<i64>,
}

impl From<&Workload> for WorkloadDto {
    fn from(w: &Workload) -> Self {
        WorkloadDto {
            namespace: w.namespace.clone(),
            name: w.name.clone(),
            priority: w.priority,
            annotations: w.annotations.clone(),
            labels: w.labels.clone(),
            owner_references: w.owner_references.iter().map(OwnerReferenceDto::from).collect(),
            bound_node: w.bound_node.clone(),
            termination_grace_seconds: w.termination_grace_seconds,
        }
    }
}

impl From<WorkloadDto> for Workload {
    fn from(dto: WorkloadDto) -> Self {
        Workload {
            namespace: dto.namespace,
            name: dto.name,
            priority: dto.priority,
            annotations: dto.annotations,
            labels: dto.labels,
            owner_references: dto.owner_references.into_iter().map(OwnerReference::from).collect(),
            bound_node: dto.bound_node,
            termination_grace_seconds: dto.termination_grace_seconds,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaintDto {
    pub key: String,
    pub value: String,
    pub effect: String,
}

impl From<&Taint> for TaintDto {
    fn from(t: &Taint) -> Self {
        TaintDto { key: t.key.clone(), value: t.value.clone(), effect: t.effect.as_str().to_string() }
    }
}

impl TryFrom<TaintDto> for Taint {
    type Error = Error;

    fn try_from(dto: TaintDto) -> Result<Self> {
        let effect = TaintEffect::parse(&dto.effect)
            .ok_or_else(|| Error::ClusterApi(crate::error::ClusterApiError::InvalidTaintEffect(dto.effect.clone())))?;
        Ok(Taint { key: dto.key, value: dto.value, effect })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub name: String,
    #[serde(default)]
    pub taints: Vec<TaintDto>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl From<&Node> for NodeDto {
    fn from(node: &Node) -> Self {
        NodeDto {
            name: node.name.clone(),
            taints: node.taints.iter().map(TaintDto::from).collect(),
            annotations: node.annotations.clone(),
        }
    }
}

impl TryFrom<NodeDto> for Node {
    type Error = Error;

    fn try_from(dto: NodeDto) -> Result<Self> {
        let taints = dto.taints.into_iter().map(Taint::try_from).collect::<Result<Vec<_>>>()?;
        Ok(Node { name: dto.name, taints, annotations: dto.annotations })
    }
}

/// One entry of the legacy, JSON-serialized taint list stored under
/// `scheduler.alpha.kubernetes.io/taints`. Kept separate from
/// `TaintDto` because the legacy format predates structured taints and is
/// only ever read, never written in its original shape past the one-time
/// migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyTaintDto {
    pub key: String,
    pub value: String,
    pub effect: String,
}

/// Parses the legacy annotation's JSON array, if present.
pub fn parse_legacy_taints(node: &Node) -> Result<Option<Vec<LegacyTaintDto>>> {
    match node.annotations.get(LEGACY_TAINTS_ANNOTATION) {
        Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
        None => Ok(None),
    }
}

/// Re-serializes a stripped legacy taint list back into annotation form.
pub fn serialize_legacy_taints(taints: &[LegacyTaintDto]) -> Result<String> {
    Ok(serde_json::to_string(taints)?)
}
