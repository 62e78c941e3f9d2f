use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
};

use serde::Serialize;

static METRICS: OnceLock<Mutex<MetricsState>> = OnceLock::new();

struct MetricsState {
    total: u64,
    errors: u64,
    per_endpoint: HashMap<&'static str, u64>,
    per_endpoint_err: HashMap<&'static str, u64>,
    // 注册工作流计数
    registration_ok: u64,
    registration_failed: HashMap<String, u64>,
    deployment_total: u64,
    // 存储上传计数
    upload_ok: u64,
    upload_failed: u64,
}

fn state() -> &'static Mutex<MetricsState> {
    METRICS.get_or_init(|| {
        Mutex::new(MetricsState {
            total: 0,
            errors: 0,
            per_endpoint: HashMap::new(),
            per_endpoint_err: HashMap::new(),
            registration_ok: 0,
            registration_failed: HashMap::new(),
            deployment_total: 0,
            upload_ok: 0,
            upload_failed: 0,
        })
    })
}

fn lock() -> std::sync::MutexGuard<'static, MetricsState> {
    match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(), // 避免因锁污染导致 panic
    }
}

pub fn count_ok(endpoint: &'static str) {
    let mut s = lock();
    s.total += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
}

pub fn count_err(endpoint: &'static str) {
    let mut s = lock();
    s.total += 1;
    s.errors += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
    *s.per_endpoint_err.entry(endpoint).or_insert(0) += 1;
}

pub fn inc_registration_ok() {
    let mut s = lock();
    s.registration_ok += 1;
}

/// 注册失败按错误类别分桶
pub fn inc_registration_failed(kind: &str) {
    let mut s = lock();
    *s.registration_failed.entry(kind.to_string()).or_insert(0) += 1;
}

pub fn inc_deployment() {
    let mut s = lock();
    s.deployment_total += 1;
}

pub fn inc_upload_ok() {
    let mut s = lock();
    s.upload_ok += 1;
}

pub fn inc_upload_failed() {
    let mut s = lock();
    s.upload_failed += 1;
}

/// 轻量指标快照（JSON输出，无Prometheus依赖）
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub errors_total: u64,
    pub per_endpoint: HashMap<&'static str, u64>,
    pub per_endpoint_errors: HashMap<&'static str, u64>,
    pub registration_ok: u64,
    pub registration_failed: HashMap<String, u64>,
    pub deployment_total: u64,
    pub upload_ok: u64,
    pub upload_failed: u64,
}

pub fn snapshot() -> MetricsSnapshot {
    let s = lock();
    MetricsSnapshot {
        requests_total: s.total,
        errors_total: s.errors,
        per_endpoint: s.per_endpoint.clone(),
        per_endpoint_errors: s.per_endpoint_err.clone(),
        registration_ok: s.registration_ok,
        registration_failed: s.registration_failed.clone(),
        deployment_total: s.deployment_total,
        upload_ok: s.upload_ok,
        upload_failed: s.upload_failed,
    }
}
