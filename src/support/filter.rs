use crate::domain::ServiceDescriptor;

/// Services whose name contains `needle`, ignoring case, in input order.
pub(crate) fn filter_services<'a>(
    services: &'a [ServiceDescriptor],
    needle: &str,
) -> Vec<&'a ServiceDescriptor> {
    let needle = needle.to_lowercase();
    services
        .iter()
        .filter(|service| service.service_name.to_lowercase().contains(&needle))
        .collect()
}
