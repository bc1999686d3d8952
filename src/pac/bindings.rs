// src/pac/bindings.rs
//! Host functions installed into the PAC script's global scope.
//!
//! Failure values follow what browsers settled on for PAC scripts and must
//! not change:
//!
//! | function              | on failure    |
//! |-----------------------|---------------|
//! | `myIpAddress()`       | `"127.0.0.1"` |
//! | `dnsResolve()`        | `null`        |
//! | `myIpAddressEx()`     | `""`          |
//! | `dnsResolveEx()`      | `""`          |
//! | `sortIpAddressList()` | `false`       |
//! | `isInNetEx()`         | `false`       |
//!
//! Bad arguments give `null`, except for `dnsResolve()`, which returns
//! nothing at all (`undefined`).

use super::engine::{self, JobQueue};
use super::ip;
use super::lock::EngineLock;
use super::strings;
use crate::interface::{ErrorListener, ProxyBindings};
use boa_engine::{Context, JsResult, JsString, JsValue, NativeFunction};
use log::debug;
use std::sync::Arc;

/// State shared by every binding of one engine instance.
pub(crate) struct BindingHost {
    pub(crate) bindings: Arc<dyn ProxyBindings>,
    pub(crate) listener: Arc<dyn ErrorListener>,
    pub(crate) lock: Arc<EngineLock>,
    pub(crate) queue: JobQueue,
}

type Binding = fn(&BindingHost, &[JsValue], &mut Context) -> JsValue;

const BINDINGS: &[(&str, usize, Binding)] = &[
    ("alert", 1, alert),
    ("myIpAddress", 0, my_ip_address),
    ("dnsResolve", 1, dns_resolve),
    // Microsoft extensions
    ("dnsResolveEx", 1, dns_resolve_ex),
    ("myIpAddressEx", 0, my_ip_address_ex),
    ("sortIpAddressList", 1, sort_ip_address_list),
    ("isInNetEx", 2, is_in_net_ex),
];

/// Registers every binding as a global function of `context`.
pub(crate) fn install(context: &mut Context, host: &Arc<BindingHost>) -> JsResult<()> {
    for &(name, length, binding) in BINDINGS {
        let host = Arc::clone(host);
        // SAFETY: the closure captures only an `Arc` of host-side state, which
        // holds no garbage-collected values and needs no tracing.
        let function = unsafe {
            NativeFunction::from_closure(move |_this, args, context| {
                Ok(binding(&host, args, context))
            })
        };
        context.register_global_callable(JsString::from(name), length, function)?;
    }
    Ok(())
}

/// The hostname argument, if it is present, a string, and pure ASCII.
fn hostname_arg(args: &[JsValue]) -> Option<String> {
    strings::string_arg(args, 0).and_then(strings::ascii_from_js)
}

fn alert(host: &BindingHost, args: &[JsValue], context: &mut Context) -> JsValue {
    // Only the first argument counts; a missing one reads as "undefined".
    let message = match args.first() {
        None => "undefined".to_string(),
        Some(value) => match strings::stringify(value, context) {
            Some(message) => message,
            None => return JsValue::undefined(),
        },
    };
    host.listener.alert_message(&message);
    JsValue::undefined()
}

fn my_ip_address(host: &BindingHost, _args: &[JsValue], context: &mut Context) -> JsValue {
    let address = engine::wait_for(host, context, || host.bindings.my_ip_address());
    match address {
        Some(address) => strings::to_js_value(&address),
        None => {
            debug!("myIpAddress() lookup failed, answering 127.0.0.1");
            strings::to_js_value("127.0.0.1")
        }
    }
}

fn my_ip_address_ex(host: &BindingHost, _args: &[JsValue], context: &mut Context) -> JsValue {
    let list = engine::wait_for(host, context, || host.bindings.my_ip_address_ex());
    strings::to_js_value(list.as_deref().unwrap_or(""))
}

fn dns_resolve(host: &BindingHost, args: &[JsValue], context: &mut Context) -> JsValue {
    let Some(hostname) = hostname_arg(args) else {
        return JsValue::undefined();
    };
    match engine::wait_for(host, context, || host.bindings.dns_resolve(&hostname)) {
        Some(address) => strings::to_js_value(&address),
        None => JsValue::null(),
    }
}

fn dns_resolve_ex(host: &BindingHost, args: &[JsValue], context: &mut Context) -> JsValue {
    let Some(hostname) = hostname_arg(args) else {
        return JsValue::null();
    };
    let list = engine::wait_for(host, context, || host.bindings.dns_resolve_ex(&hostname));
    strings::to_js_value(list.as_deref().unwrap_or(""))
}

fn sort_ip_address_list(_host: &BindingHost, args: &[JsValue], _context: &mut Context) -> JsValue {
    let Some(list) = strings::string_arg(args, 0) else {
        return JsValue::null();
    };
    match ip::sort_ip_address_list(&strings::to_utf8(list)) {
        Ok(sorted) => strings::to_js_value(&sorted),
        Err(e) => {
            debug!("sortIpAddressList() failed: {}", e);
            JsValue::from(false)
        }
    }
}

fn is_in_net_ex(_host: &BindingHost, args: &[JsValue], _context: &mut Context) -> JsValue {
    let (Some(address), Some(prefix)) = (strings::string_arg(args, 0), strings::string_arg(args, 1))
    else {
        return JsValue::null();
    };
    JsValue::from(ip::is_in_net_ex(
        &strings::to_utf8(address),
        &strings::to_utf8(prefix),
    ))
}
