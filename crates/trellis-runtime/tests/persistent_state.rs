//! Integration tests for persistent state across a dispatch.

mod common;

use common::{get, host, products, shop_env};
use serde_json::{json, Value};
use trellis_component::ComponentContext;
use trellis_event::{Args, Outcome};
use trellis_runtime::testing::TestHttp;
use trellis_runtime::DispatchError;
use trellis_types::ComponentPath;

const PRODUCTS_URL: &str = "http://example.com/shop/products/default";

// =============================================================================
// Freezing
// =============================================================================

mod freezing {
    use super::*;

    #[test]
    fn state_is_frozen_after_render() {
        let env = shop_env(TestHttp::get(PRODUCTS_URL));
        let presenter = products().on("renderDefault", |_, ctx| {
            ctx.set_param("lang", json!("cs"));
            Ok(Outcome::Continue)
        });
        let mut host = host(&env, presenter, get("Shop:Products", &[]));
        host.run().expect("run");

        let state = host.global_state().expect("frozen state is readable");
        assert_eq!(state.get("lang"), Some(&json!("cs")));

        let url = host
            .create_link(&ComponentPath::root(), "this", Args::new())
            .expect("link");
        assert_eq!(url, "/shop/products/default?lang=cs");
    }

    #[test]
    fn early_exit_leaves_state_unreadable() {
        let env = shop_env(TestHttp::head(PRODUCTS_URL));
        let mut host = host(&env, products(), get("Shop:Products", &[]));
        assert_eq!(host.run().expect("run"), Outcome::Terminate);

        let err = host.global_state().expect_err("not frozen");
        assert!(matches!(
            err,
            DispatchError::InvalidState(ref m) if m == "Presenter is shutting down, cannot save state."
        ));
    }

    #[test]
    fn ajax_payload_carries_frozen_state() {
        let env = shop_env(TestHttp::get(PRODUCTS_URL).ajax());
        let mut host = host(&env, products(), get("Shop:Products", &[("lang", json!("de"))]));
        host.run().expect("run");

        let frozen = host.global_state().expect("frozen");
        let closed = env.ajax.closed();
        assert_eq!(closed[0]["state"], Value::Object(frozen));
        assert_eq!(closed[0]["state"]["lang"], json!("de"));
    }
}

// =============================================================================
// Restoring
// =============================================================================

mod restoring {
    use super::*;

    #[test]
    fn values_are_coerced_to_declared_types() {
        let env = shop_env(TestHttp::get(PRODUCTS_URL));
        let mut host = host(&env, products(), get("Shop:Products", &[("lang", json!(["a", "b"]))]));
        host.run().expect("run");

        assert_eq!(host.state().params().get("lang"), Some(&json!("en")));
        let url = host
            .create_link(&ComponentPath::root(), "this", Args::new())
            .expect("link");
        assert_eq!(url, "/shop/products/default");
    }

    #[test]
    fn bags_of_absent_components_stay_on_the_current_page() {
        let env = shop_env(TestHttp::get(PRODUCTS_URL));
        let mut host = host(&env, products(), get("Shop:Products", &[("cart-count", json!(2))]));
        host.run().expect("run");
        let root = ComponentPath::root();

        assert_eq!(
            host.create_link(&root, "this", Args::new()).expect("this"),
            "/shop/products/default?cart-count=2"
        );
        assert_eq!(
            host.create_link(&root, "show", Args::new().arg(json!(1))).expect("show"),
            "/shop/products/show?id=1"
        );
    }

    #[test]
    fn reserved_keys_stay_with_the_presenter() {
        let env = shop_env(TestHttp::get(PRODUCTS_URL));
        let mut host = host(
            &env,
            products(),
            get("Shop:Products", &[("do", json!("logout")), ("_fid", json!("x1"))]),
        );
        host.run().expect("run");

        let params = host.state().params();
        assert_eq!(params.get("do"), Some(&json!("logout")));
        assert_eq!(params.get("_fid"), Some(&json!("x1")));
        assert!(host.state().tree().is_empty());
    }
}
