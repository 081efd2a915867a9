//! Shared fixtures for dispatch integration tests.
//!
//! | Class | Kind | Persistent | Handlers |
//! |-------|------|------------|----------|
//! | `BasePresenter` | presenter | `lang = "en"` | - |
//! | `ProductsPresenter` | presenter, extends Base | `grid` component | `actionShow(id)`, `actionEdit(id = null)`, `renderDefault`, `renderShow`, `handleLogout` |
//! | `HomePresenter` | presenter | - | `actionDefault`, `renderDefault` |
//! | `Grid` | control | `page = 1` | `handleSort(column = "name")`, `handleNext` |
//!
//! Presenters are loadable as `Shop:Products` and `Shop:Home`.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use trellis_component::{ClassDecl, ClassRegistry, MethodDecl};
use trellis_event::{Request, RequestMethod};
use trellis_runtime::testing::{TestEnv, TestHttp, TestPresenter};
use trellis_runtime::{PresenterHost, TrellisConfig};
use trellis_types::Params;

/// Registry with the shop classes.
pub fn shop_classes() -> Arc<ClassRegistry> {
    let classes = ClassRegistry::new();
    classes
        .register(ClassDecl::presenter("BasePresenter").persistent("lang", json!("en")))
        .expect("BasePresenter");
    classes
        .register(
            ClassDecl::presenter("ProductsPresenter")
                .extends("BasePresenter")
                .persistent_component("grid")
                .method(MethodDecl::new("actionShow").arg("id"))
                .method(MethodDecl::new("actionEdit").arg_or("id", Value::Null))
                .method(MethodDecl::new("renderDefault"))
                .method(MethodDecl::new("renderShow"))
                .method(MethodDecl::new("handleLogout")),
        )
        .expect("ProductsPresenter");
    classes
        .register(
            ClassDecl::presenter("HomePresenter")
                .method(MethodDecl::new("actionDefault"))
                .method(MethodDecl::new("renderDefault")),
        )
        .expect("HomePresenter");
    classes
        .register(
            ClassDecl::control("Grid")
                .persistent("page", json!(1))
                .method(MethodDecl::new("handleSort").arg_or("column", json!("name")))
                .method(MethodDecl::new("handleNext")),
        )
        .expect("Grid");
    Arc::new(classes)
}

/// Shop environment serving `http` with canonicalization off.
pub fn shop_env(http: TestHttp) -> TestEnv {
    let mut config = TrellisConfig::default();
    config.presenter.auto_canonicalize = false;
    TestEnv::new(shop_classes())
        .with_presenter("Shop:Products", "ProductsPresenter")
        .with_presenter("Shop:Home", "HomePresenter")
        .with_http(http)
        .with_config(config)
}

pub fn params(pairs: &[(&str, Value)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

pub fn get(presenter: &str, pairs: &[(&str, Value)]) -> Request {
    Request::new(presenter, RequestMethod::Get, params(pairs))
}

pub fn products() -> TestPresenter {
    TestPresenter::new("ProductsPresenter")
}

pub fn home() -> TestPresenter {
    TestPresenter::new("HomePresenter")
}

/// Host for `presenter` serving `request` in `env`.
pub fn host(env: &TestEnv, presenter: TestPresenter, request: Request) -> PresenterHost {
    PresenterHost::new(Box::new(presenter), request, env.services()).expect("presenter host")
}
