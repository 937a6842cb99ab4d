//! Ordered routing rules for the asset cache.
//!
//! Every intercepted request is classified by walking a fixed-priority list:
//! pass-through checks first, then `Navigate`, `Image`, `Font`, `Asset`, and
//! finally the catch-all `Default`. Each class maps to one [`Strategy`].

use std::sync::OnceLock;

use regex::Regex;
use reqwest::{Method, Url};

use crate::domain::entities::FetchRequest;

use super::image_url::OPTIMIZE_ENDPOINT;

/// Resource classes, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// Full-page navigation.
    Navigate,
    /// Raster or vector image, including proxy output.
    Image,
    /// Web font.
    Font,
    /// Stylesheet or script.
    Asset,
    /// Anything else.
    Default,
}

impl ResourceClass {
    /// Lowercase name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Image => "image",
            Self::Font => "font",
            Self::Asset => "asset",
            Self::Default => "default",
        }
    }
}

/// What to serve when the strategy cannot produce a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Propagate the failure.
    None,
    /// The cached response for the same request.
    CachedRequest,
    /// The cached response for the same request, else the cached root page.
    CachedRoot,
    /// The pre-cached placeholder image.
    PlaceholderAsset,
}

/// Caching strategy with its fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fetch first; fall back on network failure.
    NetworkFirst(Fallback),
    /// Serve from cache; fetch and store on a miss.
    CacheFirst(Fallback),
}

/// Why a request is left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// Not a GET.
    NonGet,
    /// Different scheme, host or port than the site.
    CrossOrigin,
    /// API call other than the image proxy.
    Api,
}

/// Outcome of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not handled by the cache.
    PassThrough(PassReason),
    /// Handled with the given strategy.
    Handle {
        /// Matched class.
        class: ResourceClass,
        /// Strategy to apply.
        strategy: Strategy,
    },
}

#[derive(Debug, Clone)]
enum Matcher {
    Navigation,
    Extension(&'static Regex),
    PathPrefix(&'static str),
    Path(&'static str),
    Any,
}

impl Matcher {
    fn matches(&self, request: &FetchRequest) -> bool {
        let path = request.url.path();
        match self {
            Self::Navigation => request.is_navigation(),
            Self::Extension(re) => re.is_match(path),
            Self::PathPrefix(prefix) => path.starts_with(prefix),
            Self::Path(exact) => path == *exact,
            Self::Any => true,
        }
    }
}

/// A class, the matchers that select it, and its strategy.
#[derive(Debug, Clone)]
pub struct Rule {
    class: ResourceClass,
    matchers: Vec<Matcher>,
    strategy: Strategy,
}

impl Rule {
    /// Returns the rule's class.
    #[must_use]
    pub const fn class(&self) -> ResourceClass {
        self.class
    }

    /// Returns the rule's strategy.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    fn matches(&self, request: &FetchRequest) -> bool {
        self.matchers.iter().any(|m| m.matches(request))
    }
}

fn image_extension() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\.(png|jpe?g|gif|webp|avif|svg|ico)$").expect("Invalid regex")
    })
}

fn font_extension() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(woff2?|ttf|otf|eot)$").expect("Invalid regex"))
}

fn asset_extension() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(css|js|mjs)$").expect("Invalid regex"))
}

/// The ordered rule list for one origin.
#[derive(Debug, Clone)]
pub struct RuleSet {
    origin: url::Origin,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates the standard rule list for `site`.
    #[must_use]
    pub fn new(site: &Url) -> Self {
        let rules = vec![
            Rule {
                class: ResourceClass::Navigate,
                matchers: vec![Matcher::Navigation],
                strategy: Strategy::NetworkFirst(Fallback::CachedRoot),
            },
            Rule {
                class: ResourceClass::Image,
                matchers: vec![
                    Matcher::Extension(image_extension()),
                    Matcher::PathPrefix("/images/"),
                    Matcher::Path(OPTIMIZE_ENDPOINT),
                ],
                strategy: Strategy::CacheFirst(Fallback::PlaceholderAsset),
            },
            Rule {
                class: ResourceClass::Font,
                matchers: vec![
                    Matcher::Extension(font_extension()),
                    Matcher::PathPrefix("/fonts/"),
                ],
                strategy: Strategy::CacheFirst(Fallback::None),
            },
            Rule {
                class: ResourceClass::Asset,
                matchers: vec![
                    Matcher::Extension(asset_extension()),
                    Matcher::PathPrefix("/_next/static/"),
                ],
                strategy: Strategy::CacheFirst(Fallback::None),
            },
            Rule {
                class: ResourceClass::Default,
                matchers: vec![Matcher::Any],
                strategy: Strategy::NetworkFirst(Fallback::CachedRequest),
            },
        ];

        Self {
            origin: site.origin(),
            rules,
        }
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns true if `url` belongs to the site.
    #[must_use]
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }

    /// Classifies a request.
    #[must_use]
    pub fn route(&self, request: &FetchRequest) -> Route {
        if request.method != Method::GET {
            return Route::PassThrough(PassReason::NonGet);
        }
        if !self.is_same_origin(&request.url) {
            return Route::PassThrough(PassReason::CrossOrigin);
        }
        let path = request.url.path();
        if path.starts_with("/api/") && path != OPTIMIZE_ENDPOINT {
            return Route::PassThrough(PassReason::Api);
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(request))
            .map_or(
                Route::Handle {
                    class: ResourceClass::Default,
                    strategy: Strategy::NetworkFirst(Fallback::CachedRequest),
                },
                |rule| Route::Handle {
                    class: rule.class,
                    strategy: rule.strategy,
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::new(&Url::parse("https://avtor.bg").unwrap())
    }

    fn get(path: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(&format!("https://avtor.bg{path}")).unwrap())
    }

    fn class_of(route: Route) -> Option<ResourceClass> {
        match route {
            Route::Handle { class, .. } => Some(class),
            Route::PassThrough(_) => None,
        }
    }

    #[test]
    fn test_non_get_passes_through() {
        let mut request = get("/contact");
        request.method = Method::POST;
        assert_eq!(rules().route(&request), Route::PassThrough(PassReason::NonGet));
    }

    #[test]
    fn test_cross_origin_passes_through() {
        let request = FetchRequest::get(Url::parse("https://js.stripe.com/v3/app.js").unwrap());
        assert_eq!(rules().route(&request), Route::PassThrough(PassReason::CrossOrigin));

        let request = FetchRequest::get(Url::parse("http://avtor.bg/images/a.png").unwrap());
        assert_eq!(rules().route(&request), Route::PassThrough(PassReason::CrossOrigin));
    }

    #[test]
    fn test_api_passes_through_except_optimizer() {
        assert_eq!(
            rules().route(&get("/api/create-payment-intent")),
            Route::PassThrough(PassReason::Api)
        );
        assert_eq!(
            rules().route(&get("/api/optimize-image?url=x")),
            Route::Handle {
                class: ResourceClass::Image,
                strategy: Strategy::CacheFirst(Fallback::PlaceholderAsset),
            }
        );
    }

    #[test]
    fn test_navigation_wins_over_extension() {
        let request = FetchRequest::navigate(Url::parse("https://avtor.bg/books/cover.png").unwrap());
        assert_eq!(
            rules().route(&request),
            Route::Handle {
                class: ResourceClass::Navigate,
                strategy: Strategy::NetworkFirst(Fallback::CachedRoot),
            }
        );
    }

    #[test]
    fn test_resource_classes() {
        let rules = rules();
        assert_eq!(class_of(rules.route(&get("/images/hero"))), Some(ResourceClass::Image));
        assert_eq!(class_of(rules.route(&get("/photo.JPG"))), Some(ResourceClass::Image));
        assert_eq!(class_of(rules.route(&get("/favicon.ico"))), Some(ResourceClass::Image));
        assert_eq!(class_of(rules.route(&get("/fonts/inter"))), Some(ResourceClass::Font));
        assert_eq!(class_of(rules.route(&get("/static/a.woff2"))), Some(ResourceClass::Font));
        assert_eq!(class_of(rules.route(&get("/styles/site.css"))), Some(ResourceClass::Asset));
        assert_eq!(
            class_of(rules.route(&get("/_next/static/chunks/main"))),
            Some(ResourceClass::Asset)
        );
        assert_eq!(class_of(rules.route(&get("/manifest.json"))), Some(ResourceClass::Default));
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let classes: Vec<_> = rules().rules().iter().map(Rule::class).collect();
        assert_eq!(
            classes,
            vec![
                ResourceClass::Navigate,
                ResourceClass::Image,
                ResourceClass::Font,
                ResourceClass::Asset,
                ResourceClass::Default,
            ]
        );
    }
}
