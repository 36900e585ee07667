// CDC topic page scraping
//
// Each hardcoded topic page is fetched once and mined for (heading, body)
// pairs: every h2/h3 inside the page body yields one example whose question
// is "<heading> of <topic>?" and whose answer is the text of the sibling
// p/ul elements up to the next heading. Headings with no body text are
// skipped silently; a failed fetch aborts the whole run.

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use super::TrainingExample;

/// Hardcoded CDC topic pages, as (topic, url).
pub const CDC_TOPICS: &[(&str, &str)] = &[
    ("Alcohol and Public Health", "https://www.cdc.gov/alcohol/index.html"),
    ("Alzheimer's Disease", "https://www.cdc.gov/aging/alzheimers-disease.htm"),
    ("Arthritis", "https://www.cdc.gov/arthritis/index.htm"),
    ("Asthma", "https://www.cdc.gov/asthma/index.html"),
    ("Autism Spectrum Disorder", "https://www.cdc.gov/ncbddd/autism/index.html"),
    ("Cancer", "https://www.cdc.gov/cancer/"),
    ("Chronic Kidney Disease", "https://www.cdc.gov/kidneydisease/index.html"),
    ("COPD", "https://www.cdc.gov/copd/index.html"),
    ("COVID-19", "https://www.cdc.gov/coronavirus/2019-ncov/index.html"),
    ("Diabetes", "https://www.cdc.gov/diabetes/index.html"),
    ("Diet and Nutrition", "https://www.cdc.gov/nutrition/index.html"),
    ("Disability and Health", "https://www.cdc.gov/disabilityandhealth/index.html"),
    ("Ebola Virus Disease", "https://www.cdc.gov/vhf/ebola/index.html"),
    ("Environmental Health", "https://www.cdc.gov/nceh/index.html"),
    ("Influenza (Flu)", "https://www.cdc.gov/flu/index.htm"),
    ("Heart Disease", "https://www.cdc.gov/heartdisease/index.htm"),
    ("Hypertension", "https://www.cdc.gov/high-blood-pressure/index.html"),
    ("HIV/AIDS", "https://www.cdc.gov/hiv/index.html"),
    ("HPV", "https://www.cdc.gov/hpv/index.html"),
    ("Immunization and Vaccines", "https://www.cdc.gov/vaccines/index.html"),
    ("Injury Prevention", "https://www.cdc.gov/injury/index.html"),
    ("Lyme Disease", "https://www.cdc.gov/lyme/index.html"),
    ("Mental Health", "https://www.cdc.gov/mentalhealth/index.htm"),
    ("Motor Vehicle Safety", "https://www.cdc.gov/motorvehiclesafety/index.html"),
    ("Obesity", "https://www.cdc.gov/obesity/index.html"),
    ("Oral Health", "https://www.cdc.gov/oralhealth/index.html"),
    ("Pneumonia", "https://www.cdc.gov/pneumonia/index.html"),
    ("Prescription Drug Overdose", "https://www.cdc.gov/drugoverdose/index.html"),
    ("STD", "https://www.cdc.gov/std/index.htm"),
    ("Stroke", "https://www.cdc.gov/stroke/index.htm"),
    ("Suicide Prevention", "https://www.cdc.gov/violenceprevention/suicide/index.html"),
    ("Tobacco and Smoking", "https://www.cdc.gov/tobacco/index.htm"),
    ("Tuberculosis (TB)", "https://www.cdc.gov/tb/topic/basics/index.html"),
    ("Vaccine Safety", "https://www.cdc.gov/vaccinesafety/index.html"),
    ("Vision Health", "https://www.cdc.gov/visionhealth/index.html"),
    ("Zika Virus", "https://www.cdc.gov/zika/index.html"),
    ("Monkeypox", "https://www.cdc.gov/poxvirus/monkeypox/index.html"),
    ("Measles", "https://www.cdc.gov/measles/index.html"),
    ("Meningitis", "https://www.cdc.gov/meningitis/index.html"),
    ("Hepatitis", "https://www.cdc.gov/hepatitis/index.html"),
    ("Parkinson's Disease", "https://www.cdc.gov/aging/resources/quick-facts-parkinsons-disease.html"),
    ("Lead Poisoning", "https://www.cdc.gov/nceh/lead/"),
    ("Rabies", "https://www.cdc.gov/rabies/exposure/index.html"),
    ("Salmonella", "https://www.cdc.gov/salmonella/index.html"),
    ("Pertussis", "https://www.cdc.gov/pertussis/index.html"),
    ("Polio", "https://www.cdc.gov/polio/index.htm"),
    ("Chronic Liver Disease", "https://www.cdc.gov/hepatitis/statistics/index.htm"),
    ("Kidney Health for Life", "https://www.cdc.gov/kidneydisease/kidney-health-for-life.html"),
];

/// Scrape all hardcoded topic pages.
pub async fn scrape_cdc(client: &Client) -> Result<Vec<TrainingExample>> {
    let pb = ProgressBar::new(CDC_TOPICS.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut examples = Vec::new();
    for &(topic, url) in CDC_TOPICS {
        pb.set_message(format!("Scraping {topic}"));
        tracing::info!(topic, url, "Scraping");

        let html = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?
            .error_for_status()
            .with_context(|| format!("Bad status from {url}"))?
            .text()
            .await
            .with_context(|| format!("Failed to read body of {url}"))?;

        examples.extend(extract_topic(&html, topic)?);
        pb.inc(1);
    }
    pb.finish_with_message("Scrape complete");

    Ok(examples)
}

/// Extract (heading, sibling text) examples from one topic page.
///
/// The body container is resolved by a fallback chain of selectors; a page
/// with no recognizable container yields no examples.
pub fn extract_topic(html: &str, topic: &str) -> Result<Vec<TrainingExample>> {
    let document = Html::parse_document(html);
    let body_selectors = [selector("div.col-md-8")?, selector("main")?];
    let heading_selector = selector("h2, h3")?;

    let body = match body_selectors.iter().find_map(|s| document.select(s).next()) {
        Some(body) => body,
        None => return Ok(Vec::new()),
    };

    let mut examples = Vec::new();
    for heading in body.select(&heading_selector) {
        let title = element_text(&heading);
        let answer = sibling_text(&heading);
        if title.is_empty() || answer.is_empty() {
            continue;
        }
        examples.push(TrainingExample::new(format!("{title} of {topic}?"), answer));
    }

    Ok(examples)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {css:?}: {e}"))
}

/// Concatenated text of the p/ul siblings following a heading, stopping at
/// the next h2/h3. One line per sibling element, as in the source pages.
fn sibling_text(heading: &ElementRef) -> String {
    let mut parts = Vec::new();
    for node in heading.next_siblings() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        match element.value().name() {
            "h2" | "h3" => break,
            "p" | "ul" => {
                let text = element_text(&element);
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            _ => {}
        }
    }
    parts.join("\n")
}

/// Whitespace-normalized text content of an element.
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
