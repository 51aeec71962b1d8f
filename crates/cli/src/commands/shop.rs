//! Interactive shopping session.
//!
//! # Usage
//!
//! ```bash
//! ps-cli shop
//! ps-cli shop --catalog products.json
//! ```
//!
//! One command per line; type `help` inside the session for the list.

use std::io::Write;
use std::path::Path;

use secrecy::SecretString;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use pocket_shop_core::ProductId;
use pocket_shop_storefront::services::{AuthService, OrderGateway, ProductSource, StaticCatalog};
use pocket_shop_storefront::{AppState, ShopSession};

use super::CommandError;
use super::output::{
    write_cart, write_confirmation, write_orders, write_product_detail, write_product_table,
};

const HELP: &str = "\
Commands:
  list                       list products
  show <id>                  show one product
  add <id>                   add a product to the cart
  cart                       show the cart
  reset                      empty the cart
  login <email> <password>   sign in
  checkout <address...>      place an order and empty the cart
  orders                     list your orders
  help                       show this help
  quit                       leave the session";

/// One line of session input.
#[derive(Debug)]
pub enum SessionCommand {
    List,
    Show(ProductId),
    Add(ProductId),
    Cart,
    Reset,
    Login { email: String, password: SecretString },
    Checkout { address: String },
    Orders,
    Help,
    Quit,
}

/// Why a line could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl SessionCommand {
    /// Parse one input line. Blank lines yield `None`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for unknown commands or missing arguments.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "list" | "ls" => Self::List,
            "show" => Self::Show(single_id(words, "show <id>")?),
            "add" => Self::Add(single_id(words, "add <id>")?),
            "cart" => Self::Cart,
            "reset" | "clear" => Self::Reset,
            "login" => match (words.next(), words.next(), words.next()) {
                (Some(email), Some(password), None) => Self::Login {
                    email: email.to_string(),
                    password: SecretString::from(password),
                },
                _ => return Err(ParseError::Usage("login <email> <password>")),
            },
            "checkout" => {
                let address = words.collect::<Vec<_>>().join(" ");
                if address.is_empty() {
                    return Err(ParseError::Usage("checkout <shipping address>"));
                }
                Self::Checkout { address }
            }
            "orders" => Self::Orders,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn single_id<'a>(
    mut words: impl Iterator<Item = &'a str>,
    usage: &'static str,
) -> Result<ProductId, ParseError> {
    match (words.next(), words.next()) {
        (Some(id), None) => Ok(ProductId::new(id)),
        _ => Err(ParseError::Usage(usage)),
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Run a session on stdin, browsing the backend or a bundled catalog file.
pub async fn run(
    state: &AppState,
    catalog: Option<&Path>,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let input = BufReader::new(tokio::io::stdin());
    let auth = state.auth();

    if let Some(path) = catalog {
        let json = tokio::fs::read_to_string(path).await?;
        let bundled = StaticCatalog::from_json(&json, state.config().currency)?;
        info!(path = %path.display(), products = bundled.len(), "Loaded bundled catalog");

        let mut session = ShopSession::new(&bundled, state.client());
        repl(&mut session, &auth, input, out).await
    } else {
        let mut session = state.session();
        repl(&mut session, &auth, input, out).await
    }
}

/// Read commands until `quit` or end of input.
///
/// Failed commands are reported and the session continues; only I/O
/// errors end it early.
pub async fn repl<S, G, R, W>(
    session: &mut ShopSession<'_, S, G>,
    auth: &AuthService<'_>,
    input: R,
    out: &mut W,
) -> Result<(), CommandError>
where
    S: ProductSource,
    G: OrderGateway,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Pocket Shop. Type 'help' for commands.")?;
    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match SessionCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        match execute(session, auth, command, out).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(CommandError::App(e)) => {
                warn!(error = %e, "Session command failed");
                writeln!(out, "error: {}", e.user_message())?;
            }
            Err(e) => return Err(e),
        }
    }

    writeln!(out, "Bye.")?;
    Ok(())
}

async fn execute<S, G, W>(
    session: &mut ShopSession<'_, S, G>,
    auth: &AuthService<'_>,
    command: SessionCommand,
    out: &mut W,
) -> Result<Flow, CommandError>
where
    S: ProductSource,
    G: OrderGateway,
    W: Write,
{
    match command {
        SessionCommand::List => {
            let products = session.browse().await?;
            write_product_table(out, &products)?;
        }
        SessionCommand::Show(id) => {
            let product = session.view(&id).await?;
            write_product_detail(out, &product)?;
        }
        SessionCommand::Add(id) => {
            let cart = session.add_to_cart(&id).await?;
            let quantity = cart.line_for(&id).map_or(1, |line| line.quantity());
            writeln!(
                out,
                "Added {id} (quantity {quantity}, {} item(s) in cart)",
                cart.total_quantity()
            )?;
        }
        SessionCommand::Cart => write_cart(out, session.cart())?,
        SessionCommand::Reset => {
            session.reset();
            writeln!(out, "Cart cleared.")?;
        }
        SessionCommand::Login { email, password } => {
            let signed_in = auth.login(&email, &password).await?;
            writeln!(out, "Signed in as {}", signed_in.user().email)?;
            session.sign_in(signed_in);
        }
        SessionCommand::Checkout { address } => {
            let confirmation = session.checkout(&address).await?;
            write_confirmation(out, &confirmation)?;
        }
        SessionCommand::Orders => {
            let orders = session.orders().await?;
            write_orders(out, &orders)?;
        }
        SessionCommand::Help => writeln!(out, "{HELP}")?,
        SessionCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pocket_shop_core::{CurrencyCode, Price, Product};
    use pocket_shop_storefront::config::StorefrontConfig;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert!(matches!(SessionCommand::parse("list"), Ok(Some(SessionCommand::List))));
        assert!(matches!(SessionCommand::parse("  CART "), Ok(Some(SessionCommand::Cart))));
        assert!(matches!(SessionCommand::parse("quit"), Ok(Some(SessionCommand::Quit))));
        assert!(matches!(SessionCommand::parse("   "), Ok(None)));
    }

    #[test]
    fn test_parse_arguments() {
        match SessionCommand::parse("add p1").unwrap() {
            Some(SessionCommand::Add(id)) => assert_eq!(id.as_str(), "p1"),
            other => panic!("unexpected {other:?}"),
        }
        match SessionCommand::parse("checkout 1 Main St,  Springfield").unwrap() {
            Some(SessionCommand::Checkout { address }) => {
                assert_eq!(address, "1 Main St, Springfield");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            SessionCommand::parse("login a@b.co hunter22"),
            Ok(Some(SessionCommand::Login { ref email, .. })) if email == "a@b.co"
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            SessionCommand::parse("add").unwrap_err(),
            ParseError::Usage("add <id>")
        );
        assert_eq!(
            SessionCommand::parse("add a b").unwrap_err(),
            ParseError::Usage("add <id>")
        );
        assert_eq!(
            SessionCommand::parse("login only-email").unwrap_err(),
            ParseError::Usage("login <email> <password>")
        );
        assert_eq!(
            SessionCommand::parse("checkout").unwrap_err(),
            ParseError::Usage("checkout <shipping address>")
        );
        assert_eq!(
            SessionCommand::parse("dance").unwrap_err(),
            ParseError::Unknown("dance".to_string())
        );
    }

    #[tokio::test]
    async fn test_repl_runs_until_quit() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        let catalog = StaticCatalog::new(vec![
            Product::new("a", "Lamp", price),
            Product::new("b", "Rug", price),
        ]);
        // Nothing below reaches the network.
        let state = AppState::new(StorefrontConfig::for_api_url("http://127.0.0.1:9").unwrap())
            .unwrap();
        let auth = state.auth();
        let mut session = ShopSession::new(&catalog, state.client());

        let input: &[u8] =
            b"list\nadd a\nadd a\n\ncart\nshow zzz\nbogus\ncheckout 1 Main St\nquit\nadd b\n";
        let mut out = Vec::new();
        repl(&mut session, &auth, input, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Lamp"));
        assert!(text.contains("Added a (quantity 2, 2 item(s) in cart)"));
        assert!(text.contains("2 x Lamp"));
        assert!(text.contains("error: Not found"));
        assert!(text.contains("unknown command 'bogus'"));
        assert!(text.contains("error: sign in to check out"));
        assert!(text.ends_with("Bye.\n"));

        // The cart survives the failed checkout; input after quit is ignored.
        assert_eq!(session.cart().len(), 1);
        assert_eq!(session.cart().total_quantity(), 2);
    }
}
