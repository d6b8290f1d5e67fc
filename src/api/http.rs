//! `HttpClusterApi`: the one concrete `ClusterApi` implementation shipped
//! with this crate. Talks JSON over HTTPS to the orchestrator's control
//! plane.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::api::client::ClusterApi;
use crate::api::config::ApiConfig;
use crate::api::dto::{NodeDto, WorkloadDto};
use crate::domain::{Node, NodeView, Workload, WorkloadIdentity};
use crate::error::{ClusterApiError, Error, Result};
use crate::events::EventSink;

/// Wire content type advertised to the API server. This crate's HTTP
/// implementation always sends/receives JSON; the flag exists for operator
/// familiarity with upstream and is logged, not acted on, pending a future
/// protobuf codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    ProtobufKubernetes,
}

impl ContentType {
    pub fn parse(s: &str) -> Self {
        match s {
            "application/json" | "json" => ContentType::Json,
            _ => ContentType::ProtobufKubernetes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClusterApi {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClusterApi {
    pub fn new(config: &ApiConfig, content_type: ContentType) -> Result<Self> {
        if content_type == ContentType::ProtobufKubernetes {
            tracing::info!("kube-api-content-type=protobuf-kubernetes requested; this implementation speaks JSON only");
        }

        let mut builder = Client::builder();
        if let ApiConfig::InCluster { ca_bundle, .. } = config {
            let cert = reqwest::Certificate::from_pem(ca_bundle)
                .map_err(|e| Error::ClientConstruction(format!("invalid CA bundle: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().map_err(|e| Error::ClientConstruction(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpClusterApi { http, base_url: config.base_url().to_string(), token: config.bearer_token().map(str::to_string) })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn expect_status(resp: reqwest::Response, endpoint: &str) -> Result<reqwest::Response> {
        match resp.status() {
            StatusCode::CONFLICT => Err(Error::ClusterApi(ClusterApiError::Conflict(endpoint.to_string()))),
            StatusCode::NOT_FOUND => Err(Error::ClusterApi(ClusterApiError::NotFound(endpoint.to_string()))),
            status if status.is_success() => Ok(resp),
            status => Err(Error::ClusterApi(ClusterApiError::UnexpectedStatus { status: status.as_u16(), endpoint: endpoint.to_string() })),
        }
    }
}

#[async_trait]
impl ClusterApi for HttpClusterApi {
    async fn list_ready_nodes(&self) -> Result<Vec<NodeView>> {
        #[derive(serde::Deserialize)]
        struct NodeViewDto {
            node: NodeDto,
            residents: Vec<WorkloadDto>,
        }

        let resp = self.request(reqwest::Method::GET, "/api/v1/nodes?ready=true").send().await.map_err(ClusterApiError::Transport)?;
        let resp = Self::expect_status(resp, "list_ready_nodes").await?;
        let dtos: Vec<NodeViewDto> = resp.json().await.map_err(ClusterApiError::Transport)?;

        dtos.into_iter()
            .map(|v| Ok(NodeView::new(Node::try_from(v.node)?, v.residents.into_iter().map(Workload::from).collect())))
            .collect()
    }

    async fn list_unscheduled_workloads(&self, namespace: &str) -> Result<Vec<Workload>> {
        let path = format!("/api/v1/namespaces/{namespace}/workloads?unscheduled=true");
        let resp = self.request(reqwest::Method::GET, &path).send().await.map_err(ClusterApiError::Transport)?;
        let resp = Self::expect_status(resp, "list_unscheduled_workloads").await?;
        let dtos: Vec<WorkloadDto> = resp.json().await.map_err(ClusterApiError::Transport)?;
        Ok(dtos.into_iter().map(Workload::from).collect())
    }

    async fn list_workloads_on_node(&self, node_name: &str) -> Result<Vec<Workload>> {
        let path = format!("/api/v1/workloads?boundNode={node_name}");
        let resp = self.request(reqwest::Method::GET, &path).send().await.map_err(ClusterApiError::Transport)?;
        let resp = Self::expect_status(resp, "list_workloads_on_node").await?;
        let dtos: Vec<WorkloadDto> = resp.json().await.map_err(ClusterApiError::Transport)?;
        Ok(dtos.into_iter().map(Workload::from).collect())
    }

    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Workload>> {
        let path = format!("/api/v1/namespaces/{namespace}/workloads/{name}");
        let resp = self.request(reqwest::Method::GET, &path).send().await.map_err(ClusterApiError::Transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = Self::expect_status(resp, "get_workload").await?;
        let dto: WorkloadDto = resp.json().await.map_err(ClusterApiError::Transport)?;
        Ok(Some(Workload::from(dto)))
    }

    async fn update_node(&self, node: &Node) -> Result<()> {
        let path = format!("/api/v1/nodes/{}", node.name);
        let dto = NodeDto::from(node);
        let resp = self.request(reqwest::Method::PUT, &path).json(&dto).send().await.map_err(ClusterApiError::Transport)?;
        Self::expect_status(resp, "update_node").await?;
        Ok(())
    }

    async fn delete_workload(&self, identity: &WorkloadIdentity, grace_period_seconds: Option<i64>) -> Result<()> {
        let (namespace, name) = split_identity(identity);
        let mut path = format!("/api/v1/namespaces/{namespace}/workloads/{name}");
        if let Some(grace) = grace_period_seconds {
            path.push_str(&format!("?gracePeriodSeconds={grace}"));
        }
        let resp = self.request(reqwest::Method::DELETE, &path).send().await.map_err(ClusterApiError::Transport)?;
        Self::expect_status(resp, "delete_workload").await?;
        Ok(())
    }
}

#[async_trait]
impl EventSink for HttpClusterApi {
    async fn emit(&self, subject: &WorkloadIdentity, reason: &str, message: String) -> Result<()> {
        let (namespace, name) = split_identity(subject);
        #[derive(serde::Serialize)]
        struct EventDto<'a> {
            namespace: &'a str,
            name: &'a str,
            reason: &'a str,
            message: String,
        }

        let path = "/api/v1/events";
        let resp = self
            .request(reqwest::Method::POST, path)
            .json(&EventDto { namespace, name, reason, message })
            .send()
            .await
            .map_err(ClusterApiError::Transport)?;
        Self::expect_status(resp, "emit_event").await?;
        Ok(())
    }
}

fn split_identity(identity: &WorkloadIdentity) -> (&str, &str) {
    identity.as_str().split_once('/').unwrap_or((identity.as_str(), ""))
}
