use pacresolver::{
    EngineConfig, ErrorListener, EvalError, InitError, ProxyBindings, ProxyResolver, ResolveError,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Default)]
struct StaticBindings {
    local: Option<&'static str>,
    local_ex: Option<&'static str>,
    hosts: HashMap<&'static str, &'static str>,
    delay: Option<Duration>,
}

impl ProxyBindings for StaticBindings {
    fn my_ip_address(&self) -> Option<String> {
        self.local.map(str::to_string)
    }

    fn my_ip_address_ex(&self) -> Option<String> {
        self.local_ex.map(str::to_string)
    }

    fn dns_resolve(&self, host: &str) -> Option<String> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.hosts
            .get(host)
            .and_then(|list| list.split(';').find(|ip| !ip.contains(':')))
            .map(str::to_string)
    }

    fn dns_resolve_ex(&self, host: &str) -> Option<String> {
        self.hosts.get(host).map(|list| list.to_string())
    }
}

#[derive(Default)]
struct Collector {
    errors: Mutex<Vec<String>>,
    alerts: Mutex<Vec<String>>,
}

impl ErrorListener for Collector {
    fn error_message(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn alert_message(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }
}

fn corporate_bindings() -> StaticBindings {
    let mut hosts = HashMap::new();
    hosts.insert("intranet.corp.example", "10.20.1.5");
    hosts.insert("dual.example", "2001:db8::7;192.0.2.7");
    StaticBindings {
        local: Some("10.20.30.40"),
        local_ex: Some("10.20.30.40;2001:db8::40"),
        hosts,
        delay: None,
    }
}

fn resolver_with(bindings: StaticBindings) -> (ProxyResolver, Arc<Collector>) {
    let collector = Arc::new(Collector::default());
    let resolver = ProxyResolver::new(
        Arc::new(bindings),
        collector.clone(),
        EngineConfig::default(),
    )
    .unwrap();
    (resolver, collector)
}

const CORPORATE_PAC: &str = r#"
function FindProxyForURL(url, host) {
    if (isPlainHostName(host) || dnsDomainIs(host, ".corp.example"))
        return "DIRECT";
    if (isInNet(host, "10.0.0.0", "255.0.0.0"))
        return "DIRECT";
    if (isInNetEx(myIpAddress(), "10.20.0.0/16"))
        return "PROXY proxy-a.corp.example:8080; PROXY proxy-b.corp.example:8080; DIRECT";
    return "DIRECT";
}
"#;

#[test]
fn corporate_script_routes_requests() {
    let (mut resolver, collector) = resolver_with(corporate_bindings());
    resolver.set_script(CORPORATE_PAC).unwrap();

    assert_eq!(resolver.get_proxy_for_url("http://wiki/", "wiki").unwrap(), "DIRECT");
    assert_eq!(
        resolver
            .get_proxy_for_url("http://intranet.corp.example/", "intranet.corp.example")
            .unwrap(),
        "DIRECT"
    );
    assert_eq!(
        resolver.get_proxy_for_url("https://www.rust-lang.org/", "www.rust-lang.org").unwrap(),
        "PROXY proxy-a.corp.example:8080; PROXY proxy-b.corp.example:8080; DIRECT"
    );
    assert!(collector.errors.lock().is_empty());
}

#[test]
fn extension_functions_are_available() {
    let (mut resolver, _) = resolver_with(corporate_bindings());
    resolver
        .set_script(
            r#"
            function FindProxyForURL(url, host) {
                return [
                    myIpAddressEx(),
                    dnsResolveEx(host),
                    sortIpAddressList(dnsResolveEx(host)),
                    isResolvableEx(host),
                    isResolvable("nowhere.example")
                ].join("|");
            }
            "#,
        )
        .unwrap();
    assert_eq!(
        resolver.get_proxy_for_url("http://dual.example/", "dual.example").unwrap(),
        "10.20.30.40;2001:db8::40|2001:db8::7;192.0.2.7|2001:db8::7;192.0.2.7|true|false"
    );
}

#[test]
fn dns_resolve_distinguishes_undefined_from_null() {
    let (mut resolver, _) = resolver_with(corporate_bindings());
    resolver
        .set_script(
            r#"
            function FindProxyForURL(url, host) {
                var a = dnsResolve(host);
                var b = dnsResolve("unknown.example");
                return typeof a + "," + (b === null);
            }
            "#,
        )
        .unwrap();
    assert_eq!(
        resolver.get_proxy_for_url("http://x/", "b\u{fc}cher.example").unwrap(),
        "undefined,true"
    );
}

#[test]
fn alerts_reach_the_listener() {
    let (mut resolver, collector) = resolver_with(corporate_bindings());
    resolver
        .set_script("alert('loading'); function FindProxyForURL(url, host) { alert(host); return 'DIRECT'; }")
        .unwrap();
    resolver.get_proxy_for_url("http://a.example/", "a.example").unwrap();
    assert_eq!(*collector.alerts.lock(), vec!["loading", "a.example"]);
}

#[test]
fn non_ascii_results_are_never_forwarded() {
    let (mut resolver, collector) = resolver_with(corporate_bindings());
    resolver
        .set_script("function FindProxyForURL(url, host) { return 'PROXY ' + host + ':80'; }")
        .unwrap();
    assert_eq!(
        resolver.get_proxy_for_url("http://x/", "\u{4f8b}\u{3048}.example"),
        Err(ResolveError::ScriptFailure(EvalError::NonAsciiResult))
    );
    assert_eq!(
        collector.errors.lock().last().map(String::as_str),
        Some("FindProxyForURL() returned a non-ASCII string")
    );
    assert_eq!(
        resolver.get_proxy_for_url("http://x/", "plain.example").unwrap(),
        "PROXY plain.example:80"
    );
}

#[test]
fn replacing_a_script_takes_effect_immediately() {
    let (mut resolver, _) = resolver_with(corporate_bindings());
    resolver.set_script("function FindProxyForURL() { return 'PROXY old:1'; }").unwrap();
    assert_eq!(resolver.get_proxy_for_url("http://a/", "a").unwrap(), "PROXY old:1");

    resolver.set_script("function FindProxyForURL() { return 'PROXY new:2'; }").unwrap();
    assert_eq!(resolver.get_proxy_for_url("http://a/", "a").unwrap(), "PROXY new:2");

    let err = resolver.set_script("function FindProxyForURL( {").unwrap_err();
    assert!(matches!(err, InitError::CompileFailure { .. }));
    assert_eq!(
        resolver.get_proxy_for_url("http://a/", "a"),
        Err(ResolveError::NotInitialized)
    );
}

#[test]
fn independent_resolvers_run_concurrently() {
    let slow = || StaticBindings {
        delay: Some(Duration::from_millis(500)),
        ..corporate_bindings()
    };
    let script = "function FindProxyForURL(url, host) { return dnsResolve(host) == null ? 'DIRECT' : 'PROXY p:1'; }";

    let started = Instant::now();
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let bindings = slow();
            thread::spawn(move || {
                let (mut resolver, _) = resolver_with(bindings);
                resolver.set_script(script).unwrap();
                resolver.get_proxy_for_url("http://a/", "a.example").unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "DIRECT");
    }
    // Three serialized lookups would take at least 1500ms.
    assert!(started.elapsed() < Duration::from_millis(1400));
}

#[test]
fn slow_lookup_does_not_hold_up_other_callers() {
    let mut hosts = HashMap::new();
    hosts.insert("slow.example", "192.0.2.9");
    let (mut resolver, _) = resolver_with(StaticBindings {
        hosts,
        delay: Some(Duration::from_millis(1500)),
        ..StaticBindings::default()
    });
    resolver
        .set_script(
            r#"
            function FindProxyForURL(url, host) {
                if (host == "slow.example")
                    return "PROXY " + dnsResolve(host) + ":3128";
                return "DIRECT";
            }
            "#,
        )
        .unwrap();

    let resolver = &resolver;
    thread::scope(|s| {
        let slow = s.spawn(move || resolver.get_proxy_for_url("http://slow.example/", "slow.example"));
        thread::sleep(Duration::from_millis(200));

        let started = Instant::now();
        assert_eq!(
            resolver.get_proxy_for_url("http://fast.example/", "fast.example").unwrap(),
            "DIRECT"
        );
        assert!(started.elapsed() < Duration::from_millis(500));

        assert_eq!(slow.join().unwrap().unwrap(), "PROXY 192.0.2.9:3128");
    });
}
