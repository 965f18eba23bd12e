//! A small CLI for manually exercising the resolver during development.
//! Not a protocol surface — nothing in the crate depends on this binary.

use clap::Parser;
use tangerine_doh::config::ResolverOptions;
use tangerine_doh::dns::DNSResourceType;
use tangerine_doh::resolver::{ResolveOptions, Resolver};

#[derive(Parser)]
#[command(name = "tangerine-doh", about = "Resolve a name over DNS-over-HTTPS")]
struct Cli {
    /// Name to resolve, e.g. example.com
    name: String,

    /// Record type: A, AAAA, MX, TXT, CNAME, NS, PTR, SOA, SRV, CAA, NAPTR, CERT, TLSA, ANY
    #[arg(short = 't', long = "type", default_value = "A")]
    rrtype: String,

    /// Comma-separated DoH server hostnames
    #[arg(long)]
    servers: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    let mut options = ResolverOptions::default();
    if let Some(servers) = cli.servers {
        options.servers = servers.split(',').map(|s| s.trim().to_string()).collect();
    }

    let resolver = Resolver::new(options)?;
    let opts = ResolveOptions::default();

    let rrtype: DNSResourceType = cli
        .rrtype
        .parse()
        .map_err(|_| format!("unknown record type: {}", cli.rrtype))?;

    match rrtype {
        DNSResourceType::A => print_results(resolver.resolve_a(&cli.name, opts).await),
        DNSResourceType::AAAA => print_results(resolver.resolve_aaaa(&cli.name, opts).await),
        DNSResourceType::CNAME => print_results(resolver.resolve_cname(&cli.name, opts).await),
        DNSResourceType::NS => print_results(resolver.resolve_ns(&cli.name, opts).await),
        DNSResourceType::PTR => print_results(resolver.resolve_ptr(&cli.name, opts).await),
        DNSResourceType::MX => print_results(resolver.resolve_mx(&cli.name, opts).await),
        DNSResourceType::TXT => print_results(resolver.resolve_txt(&cli.name, opts).await),
        DNSResourceType::SRV => print_results(resolver.resolve_srv(&cli.name, opts).await),
        DNSResourceType::NAPTR => print_results(resolver.resolve_naptr(&cli.name, opts).await),
        DNSResourceType::CAA => print_results(resolver.resolve_caa(&cli.name, opts).await),
        DNSResourceType::CERT => print_results(resolver.resolve_cert(&cli.name, opts).await),
        DNSResourceType::TLSA => print_results(resolver.resolve_tlsa(&cli.name, opts).await),
        DNSResourceType::SOA => match resolver.resolve_soa(&cli.name, opts).await {
            Ok(record) => println!("{record:#?}"),
            Err(err) => eprintln!("error: {err}"),
        },
        DNSResourceType::ANY => {
            match tangerine_doh::any::resolve_any(&resolver, &cli.name, resolver.options().concurrency).await {
                Ok(records) => {
                    for record in records {
                        println!("{}: {:#?}", record.rrtype, record.values);
                    }
                }
                Err(err) => eprintln!("error: {err}"),
            }
        }
        other => eprintln!("{other} is not a supported record type for this CLI"),
    }

    Ok(())
}

fn print_results<T: std::fmt::Debug>(result: tangerine_doh::Result<Vec<T>>) {
    match result {
        Ok(records) => {
            for record in records {
                println!("{record:?}");
            }
        }
        Err(err) => eprintln!("error: {err}"),
    }
}
