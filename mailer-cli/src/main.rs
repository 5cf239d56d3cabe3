use mailer_core::email::senders::{MockSender, SmtpRelay};
use mailer_core::email::{EmailError, EmailSender};
use mailer_core::renderers::{MailRenderer, TeraRenderer};
use mailer_core::validators::MailValidator;
use mailer_core::{DeliveryOutcome, Mail, MailClient, MessageProcessor, ProcessorConf};

use flexi_logger::{Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode};
use serde_json::Value;
use std::error::Error;
use std::sync::Arc;

mod env;

const EXIT_STARTUP_FAILED: i32 = 1;
const EXIT_NOT_DELIVERED: i32 = 2;

fn main() {
    let mut conf_file_path = String::from("conf/mailer-conf.toml");
    let mut mail = Mail::builder();

    let mut args = std::env::args();

    // Eat the first argument, which is the relative path to the executable
    args.next();

    while let Some(arg) = args.next() {
        let flag = arg.to_lowercase();

        let Some(value) = args.next() else {
            eprintln!("ERROR: {flag} option specified but no value was given");
            std::process::exit(EXIT_STARTUP_FAILED);
        };

        match flag.as_str() {
            "--config" => conf_file_path = value,
            "--to" => mail = mail.recipient(value),
            "--subject" => mail = mail.subject(value),
            "--template" => mail = mail.template(value),
            "--reply-to" => mail = mail.reply_to(value),
            "--var" => {
                let Some((key, raw)) = value.split_once('=') else {
                    eprintln!("ERROR: Incorrect format for --var. Expected key=value");
                    std::process::exit(EXIT_STARTUP_FAILED);
                };

                // Values that parse as JSON keep their structure, anything else is a string
                let parsed =
                    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
                mail = mail.content(key, parsed);
            }
            a => {
                eprintln!("ERROR: Invalid argument: {}", &a);
                std::process::exit(EXIT_STARTUP_FAILED);
            }
        }
    }

    let conf = match env::initialize(&conf_file_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(EXIT_STARTUP_FAILED);
        }
    };

    let logger = match Logger::try_with_str(conf.log_level()) {
        Ok(l) => l,
        Err(_) => {
            eprintln!(
                "ERROR: Invalid log level. Options: ERROR, WARN, INFO, DEBUG, TRACE. \
                 Example: `info, mailer_core::client=trace`"
            );
            std::process::exit(EXIT_STARTUP_FAILED);
        }
    };

    let logger = logger
        .log_to_file(FileSpec::default().directory("./logs"))
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogAndCompressedFiles(60, 365),
        )
        .cleanup_in_background_thread(true)
        .duplicate_to_stderr(Duplicate::All)
        .write_mode(WriteMode::BufferAndFlush)
        .format(|writer, now, record| {
            write!(
                writer,
                "{:5} | {} | {}:{} | {}",
                record.level(),
                now.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
                record.module_path().unwrap_or("<unknown>"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .use_utc()
        .start();

    let logger = match logger {
        Ok(l) => l,
        Err(e) => {
            eprintln!("ERROR: Failed to start logger: {e}");
            std::process::exit(EXIT_STARTUP_FAILED);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(conf.worker_threads())
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ERROR: Failed to launch asynchronous runtime: {e}");
            std::process::exit(EXIT_STARTUP_FAILED);
        }
    };

    let exit_code = runtime.block_on(async move {
        let client = match start_client(conf).await {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to start mail client: {e}");
                return EXIT_STARTUP_FAILED;
            }
        };

        let outcome = client.dispatch(mail.build()).await;
        report(&outcome);

        if outcome.is_delivered() {
            0
        } else {
            EXIT_NOT_DELIVERED
        }
    });

    drop(runtime);
    drop(logger);

    std::process::exit(exit_code);
}

async fn start_client(conf: &env::Conf) -> Result<MailClient, Box<dyn Error>> {
    let processor_conf = ProcessorConf::new(
        &conf.mail.notification,
        &conf.mail.sender_address,
        conf.mail.sender_name.as_deref(),
        conf.mail.renderer.as_deref(),
    )?;

    let renderers: Vec<Box<dyn MailRenderer>> =
        vec![Box::new(TeraRenderer::from_glob(&conf.mail.templates)?)];

    let sender: EmailSender = if conf.smtp.enabled {
        log::info!("Connecting to SMTP relay...");

        let smtp_password = env::smtp_password()?;
        let relay = SmtpRelay::with_credentials(
            &conf.smtp.username,
            &smtp_password,
            &conf.smtp.address,
            conf.smtp_port(),
            conf.max_smtp_connections(),
            conf.smtp_idle_timeout(),
        )?;

        if !relay.test_connection().await? {
            return Err(EmailError::RelayConnectionFailed(format!(
                "{} did not accept a connection",
                conf.smtp.address
            ))
            .into());
        }

        log::info!("Successfully connected to SMTP relay");
        Arc::new(relay)
    } else {
        log::info!("Emails are disabled. Using mock sender.");
        Arc::new(MockSender::new())
    };

    let processor = MessageProcessor::new(renderers, processor_conf, sender)?;

    Ok(MailClient::new(processor, Arc::new(MailValidator)))
}

fn report(outcome: &DeliveryOutcome) {
    log::info!(
        "Mail \"{}\" finished with status {}",
        outcome.mail().subject(),
        outcome.status()
    );

    match serde_json::to_string_pretty(outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize delivery outcome: {e}"),
    }
}
