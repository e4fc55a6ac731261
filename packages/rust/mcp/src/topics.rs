//! Curated topic shortcuts: each one a canned query against a single source.

use magedocs_shared::SourceId;

/// Number of hits a topic tool returns.
pub const TOPIC_RESULT_LIMIT: usize = 6;

/// A fixed query exposed as its own tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    /// Tool name, prefixed with the source id.
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub source: SourceId,
    pub query: &'static str,
}

/// Look a topic up by tool name.
pub fn find_topic(name: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|topic| topic.name == name)
}

pub static TOPICS: &[Topic] = &[
    Topic {
        name: "hyva_installation_overview",
        title: "Hyvä installation overview",
        description: "Return supported platforms, Magento/MageOS versions and prerequisites for Hyvä.",
        source: SourceId::Hyva,
        query: "Hyva installation overview requirements",
    },
    Topic {
        name: "hyva_installation_steps_clean_magento",
        title: "Hyvä installation on clean Magento/MageOS",
        description: "Step-by-step Hyvä setup on a clean Magento/MageOS instance including composer commands.",
        source: SourceId::Hyva,
        query: "Install Hyva on clean Magento MageOS step by step",
    },
    Topic {
        name: "hyva_license_and_download",
        title: "Hyvä license and download",
        description: "Explain license terms, portal access and how to download Hyvä packages.",
        source: SourceId::Hyva,
        query: "Hyva license download access token",
    },
    Topic {
        name: "hyva_required_dependencies",
        title: "Hyvä required dependencies",
        description: "List PHP/Node/composer dependencies, Magento modules and tooling required by Hyvä.",
        source: SourceId::Hyva,
        query: "Hyva required dependencies php composer node",
    },
    Topic {
        name: "hyva_theme_activation_and_configuration",
        title: "Hyvä theme activation",
        description: "Describe how to activate Hyvä as the storefront theme via admin and configuration files.",
        source: SourceId::Hyva,
        query: "Hyva activate theme configure default",
    },
    Topic {
        name: "hyva_build_frontend_assets",
        title: "Hyvä frontend build",
        description: "Show commands for building Hyvä assets (npm/yarn build, dev, watch).",
        source: SourceId::Hyva,
        query: "Hyva build frontend assets npm yarn",
    },
    Topic {
        name: "hyva_tailwind_configuration",
        title: "Hyvä Tailwind configuration",
        description: "Explain Tailwind config, purge settings, safelist and extending utilities in Hyvä.",
        source: SourceId::Hyva,
        query: "Hyva Tailwind config purge safelist",
    },
    Topic {
        name: "hyva_templates_structure",
        title: "Hyvä templates structure",
        description: "Outline PHTML/layout structure, overrides and template organization in Hyvä.",
        source: SourceId::Hyva,
        query: "Hyva templates structure layout override",
    },
    Topic {
        name: "hyva_components_library_overview",
        title: "Hyvä component library",
        description: "Provide overview of built-in Hyvä components such as cart, menu and forms.",
        source: SourceId::Hyva,
        query: "Hyva component library overview",
    },
    Topic {
        name: "hyva_add_custom_component",
        title: "Add custom Hyvä component",
        description: "Describe how to create/register custom Hyvä components with Alpine/Tailwind.",
        source: SourceId::Hyva,
        query: "Hyva create custom component",
    },
    Topic {
        name: "hyva_javascript_stack",
        title: "Hyvä JavaScript stack",
        description: "Explain Alpine.js usage, JS patterns and avoiding heavy frameworks in Hyvä.",
        source: SourceId::Hyva,
        query: "Hyva JavaScript stack Alpine",
    },
    Topic {
        name: "hyva_styling_best_practices",
        title: "Hyvä styling best practices",
        description: "Guidelines for Tailwind styling, responsive patterns and utility usage in Hyvä.",
        source: SourceId::Hyva,
        query: "Hyva styling best practices Tailwind",
    },
    Topic {
        name: "hyva_checkout_customization",
        title: "Hyvä checkout customization",
        description: "Detail customization hooks and files for modifying Hyvä checkout.",
        source: SourceId::Hyva,
        query: "Hyva checkout customization guide",
    },
    Topic {
        name: "hyva_performance_optimization",
        title: "Hyvä performance",
        description: "Provide performance recommendations: critical CSS, lazy loading, caching.",
        source: SourceId::Hyva,
        query: "Hyva performance optimization",
    },
    Topic {
        name: "hyva_modules_compatibility_matrix",
        title: "Hyvä module compatibility",
        description: "Outline compatibility matrix and integration notes for popular Magento modules.",
        source: SourceId::Hyva,
        query: "Hyva modules compatibility matrix",
    },
    Topic {
        name: "hyva_translation_and_locale_handling",
        title: "Hyvä translations",
        description: "Explain translation files, i18n workflow and multi-locale handling in Hyvä.",
        source: SourceId::Hyva,
        query: "Hyva translation locale handling",
    },
    Topic {
        name: "hyva_debugging_and_troubleshooting",
        title: "Hyvä troubleshooting",
        description: "List common Hyvä issues and debugging steps (missing styles, JS errors).",
        source: SourceId::Hyva,
        query: "Hyva debugging troubleshooting",
    },
    Topic {
        name: "hyva_upgrade_guide",
        title: "Hyvä upgrade guide",
        description: "Describe process for upgrading Hyvä, reviewing changelog and merging configs.",
        source: SourceId::Hyva,
        query: "Hyva upgrade guide",
    },
    Topic {
        name: "hyva_third_party_integration_patterns",
        title: "Hyvä third-party integrations",
        description: "Show integration patterns for analytics, tracking and external widgets in Hyvä.",
        source: SourceId::Hyva,
        query: "Hyva third party integration pattern",
    },
    Topic {
        name: "hyva_full_stack_example_setup",
        title: "Hyvä full stack example",
        description: "Provide full-stack reference setup (MageOS + Hyvä + caching stack).",
        source: SourceId::Hyva,
        query: "Hyva full stack example setup",
    },
    Topic {
        name: "mageos_installation_requirements",
        title: "MageOS installation requirements",
        description: "System requirements for MageOS (PHP, DB, Elasticsearch/OpenSearch).",
        source: SourceId::Mageos,
        query: "MageOS installation requirements",
    },
    Topic {
        name: "mageos_fresh_installation_steps",
        title: "MageOS installation steps",
        description: "Detailed clean installation workflow for MageOS including composer commands.",
        source: SourceId::Mageos,
        query: "MageOS fresh installation steps",
    },
    Topic {
        name: "mageos_upgrade_and_patching",
        title: "MageOS upgrades and patches",
        description: "Procedures for upgrading MageOS and applying security patches.",
        source: SourceId::Mageos,
        query: "MageOS upgrade patching",
    },
    Topic {
        name: "mageos_module_development_basics",
        title: "MageOS module basics",
        description: "Explain module folder structure, registration.php, module.xml, di.xml.",
        source: SourceId::Mageos,
        query: "MageOS module development basics",
    },
    Topic {
        name: "mageos_theme_development_basics",
        title: "MageOS theme basics",
        description: "Guide to creating themes (inheritance, Hyvä/Satoshi integration hooks).",
        source: SourceId::Mageos,
        query: "MageOS theme development basics",
    },
    Topic {
        name: "mageos_dependency_management_composer",
        title: "MageOS composer management",
        description: "Managing composer dependencies, private repos and autoload settings for MageOS.",
        source: SourceId::Mageos,
        query: "MageOS composer dependency management",
    },
    Topic {
        name: "mageos_frontend_stack_overview",
        title: "MageOS frontend stack",
        description: "Describe layout XML, PHTML, RequireJS and legacy frontend pipeline.",
        source: SourceId::Mageos,
        query: "MageOS frontend stack overview",
    },
    Topic {
        name: "mageos_backend_configuration_important_sections",
        title: "MageOS backend configuration",
        description: "Highlight must-know admin sections (cache, indexers, store config, cron).",
        source: SourceId::Mageos,
        query: "MageOS backend configuration important sections",
    },
    Topic {
        name: "mageos_cron_and_indexers_setup",
        title: "MageOS cron and indexers",
        description: "Explain CRON/indexer setup and key bin/magento commands.",
        source: SourceId::Mageos,
        query: "MageOS cron indexers setup",
    },
    Topic {
        name: "mageos_cache_layers_explained",
        title: "MageOS cache layers",
        description: "Document caching layers (Magento cache, FPC, Varnish, Redis).",
        source: SourceId::Mageos,
        query: "MageOS cache layers explained",
    },
    Topic {
        name: "mageos_api_rest_graphql_overview",
        title: "MageOS API overview",
        description: "Summaries for REST and GraphQL APIs, tokens and usage.",
        source: SourceId::Mageos,
        query: "MageOS REST GraphQL overview",
    },
    Topic {
        name: "mageos_configuration_scopes",
        title: "MageOS configuration scopes",
        description: "Explain global/website/store scopes and theme impact.",
        source: SourceId::Mageos,
        query: "MageOS configuration scopes",
    },
    Topic {
        name: "mageos_security_best_practices",
        title: "MageOS security best practices",
        description: "Hardening guidelines: file permissions, admin users, MFA, panel protection.",
        source: SourceId::Mageos,
        query: "MageOS security best practices",
    },
    Topic {
        name: "mageos_logging_and_debugging",
        title: "MageOS logging and debugging",
        description: "Location of logs, enabling developer mode, debugging practices.",
        source: SourceId::Mageos,
        query: "MageOS logging debugging",
    },
    Topic {
        name: "mageos_database_schema_and_migrations",
        title: "MageOS DB schema and migrations",
        description: "Describe db_schema.xml, data patches and schema patches.",
        source: SourceId::Mageos,
        query: "MageOS database schema migrations",
    },
    Topic {
        name: "mageos_cli_commands_reference",
        title: "MageOS CLI reference",
        description: "List essential bin/magento commands and scenarios.",
        source: SourceId::Mageos,
        query: "MageOS CLI commands reference",
    },
    Topic {
        name: "mageos_integration_with_varnish_and_redis",
        title: "MageOS with Varnish and Redis",
        description: "Showcase configuration of Varnish/Redis layers with MageOS.",
        source: SourceId::Mageos,
        query: "MageOS integrate Varnish Redis",
    },
    Topic {
        name: "mageos_performance_optimization",
        title: "MageOS performance",
        description: "Performance best practices: production mode, statics deploy, opcache.",
        source: SourceId::Mageos,
        query: "MageOS performance optimization",
    },
    Topic {
        name: "mageos_multistore_setup",
        title: "MageOS multistore setup",
        description: "Guide for multi-website/store creation with theme bindings.",
        source: SourceId::Mageos,
        query: "MageOS multistore setup",
    },
    Topic {
        name: "mageos_full_stack_deployment_pattern",
        title: "MageOS full stack deployment",
        description: "Describe CI/CD deployment pattern, caching and post-deploy tests.",
        source: SourceId::Mageos,
        query: "MageOS full stack deployment pattern",
    },
    Topic {
        name: "satoshi_overview_and_use_cases",
        title: "Satoshi overview",
        description: "Overview of Satoshi Hyvä theme use cases and positioning.",
        source: SourceId::Satoshi,
        query: "Satoshi Hyva overview use cases",
    },
    Topic {
        name: "satoshi_installation_prerequisites",
        title: "Satoshi prerequisites",
        description: "List prerequisites: Hyvä availability, Magento versions, required modules.",
        source: SourceId::Satoshi,
        query: "Satoshi Hyva installation prerequisites",
    },
    Topic {
        name: "satoshi_installation_steps",
        title: "Satoshi installation steps",
        description: "Detailed Satoshi installation on Hyvä/MageOS.",
        source: SourceId::Satoshi,
        query: "Install Satoshi Hyva steps",
    },
    Topic {
        name: "satoshi_theme_structure",
        title: "Satoshi theme structure",
        description: "Explain directory layout, layouts, templates and assets in Satoshi.",
        source: SourceId::Satoshi,
        query: "Satoshi theme structure",
    },
    Topic {
        name: "satoshi_components_catalog",
        title: "Satoshi components catalog",
        description: "Catalogue hero/banner/grid components and file locations.",
        source: SourceId::Satoshi,
        query: "Satoshi components catalog",
    },
    Topic {
        name: "satoshi_styling_and_design_system",
        title: "Satoshi styling system",
        description: "Describe Tailwind utilities, design tokens and spacing/color rules in Satoshi.",
        source: SourceId::Satoshi,
        query: "Satoshi styling design system",
    },
    Topic {
        name: "satoshi_customization_guide",
        title: "Satoshi customization guide",
        description: "Explain overrides/child theme approach to extend Satoshi safely.",
        source: SourceId::Satoshi,
        query: "Satoshi customization best practices",
    },
    Topic {
        name: "satoshi_checkout_and_cart_customization",
        title: "Satoshi checkout/cart",
        description: "Customize cart and checkout flows delivered by Satoshi.",
        source: SourceId::Satoshi,
        query: "Satoshi checkout cart customization",
    },
    Topic {
        name: "satoshi_content_blocks_and_cms",
        title: "Satoshi CMS blocks",
        description: "Explain CMS/Page Builder integration and building landing pages in Satoshi.",
        source: SourceId::Satoshi,
        query: "Satoshi content blocks cms",
    },
    Topic {
        name: "satoshi_performance_considerations",
        title: "Satoshi performance",
        description: "Performance considerations when extending Satoshi.",
        source: SourceId::Satoshi,
        query: "Satoshi performance considerations",
    },
    Topic {
        name: "satoshi_dependencies_and_versioning",
        title: "Satoshi dependencies/versioning",
        description: "Explain dependencies (Hyvä version, packages) and versioning policy.",
        source: SourceId::Satoshi,
        query: "Satoshi dependencies versioning",
    },
    Topic {
        name: "satoshi_demo_layouts_and_presets",
        title: "Satoshi demo layouts",
        description: "List demo layouts/presets and how to import them.",
        source: SourceId::Satoshi,
        query: "Satoshi demo layouts presets",
    },
    Topic {
        name: "satoshi_navigation_and_header_patterns",
        title: "Satoshi navigation/header",
        description: "Explain mega-menu, mobile navigation and header patterns.",
        source: SourceId::Satoshi,
        query: "Satoshi navigation header patterns",
    },
    Topic {
        name: "satoshi_product_page_layouts",
        title: "Satoshi product pages",
        description: "Describe PDP layout, components and extension points.",
        source: SourceId::Satoshi,
        query: "Satoshi product page layout",
    },
    Topic {
        name: "satoshi_category_page_layouts",
        title: "Satoshi category pages",
        description: "Explain category listing layouts, filters and pagination.",
        source: SourceId::Satoshi,
        query: "Satoshi category page layout",
    },
    Topic {
        name: "satoshi_integration_with_marketing_tools",
        title: "Satoshi marketing integrations",
        description: "Patterns for integrating marketing/analytics/tag managers.",
        source: SourceId::Satoshi,
        query: "Satoshi marketing integration",
    },
    Topic {
        name: "satoshi_typical_customization_examples",
        title: "Satoshi customization examples",
        description: "Concrete examples like altering product cards or homepage sections.",
        source: SourceId::Satoshi,
        query: "Satoshi customization examples",
    },
    Topic {
        name: "satoshi_debugging_and_common_issues",
        title: "Satoshi troubleshooting",
        description: "Common Satoshi issues (style conflicts, JS errors) and diagnostics.",
        source: SourceId::Satoshi,
        query: "Satoshi debugging issues",
    },
    Topic {
        name: "satoshi_upgrade_path",
        title: "Satoshi upgrade path",
        description: "Guide to upgrading Satoshi versions safely and testing changes.",
        source: SourceId::Satoshi,
        query: "Satoshi upgrade path",
    },
    Topic {
        name: "satoshi_full_stack_example_setup",
        title: "Satoshi full stack example",
        description: "Describe MageOS + Hyvä + Satoshi deployment with caching/CDN layers.",
        source: SourceId::Satoshi,
        query: "Satoshi full stack example setup",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn twenty_topics_per_source() {
        assert_eq!(TOPICS.len(), 60);
        for source in SourceId::ALL {
            let topics: Vec<&Topic> = TOPICS.iter().filter(|t| t.source == source).collect();
            assert_eq!(topics.len(), 20, "{source}");
            assert!(topics.iter().all(|t| t.name.starts_with(&format!("{source}_"))));
        }
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<&str> = TOPICS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOPICS.len());
    }

    #[test]
    fn lookup_by_name() {
        let topic = find_topic("mageos_cli_commands_reference").unwrap();
        assert_eq!(topic.source, SourceId::Mageos);
        assert_eq!(topic.query, "MageOS CLI commands reference");
        assert!(find_topic("mageos_unknown").is_none());
    }
}
